use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use jetstreamer::{Backend, CacheOptions, CacheStore, MemoryStore, Options, build_with};

struct Post {
    id: u64,
    title: String,
    score: i64,
}

fn posts(n: usize) -> Vec<Post> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..n)
        .map(|i| Post {
            id: i as u64,
            title: format!("post number {}", rng.random_range(0..1_000_000)),
            score: rng.random_range(-50..50),
        })
        .collect()
}

fn render(options: &Options, posts: &[Post]) -> String {
    build_with(options, |json| {
        json.object(|json| {
            json.set("count", posts.len())?;
            json.set_each("posts", posts, |json, post| {
                json.object(|json| {
                    json.set("id", post.id)?;
                    json.set("title", post.title.as_str())?;
                    json.set("score", post.score)
                })
            })
        })
    })
    .expect("render")
}

fn render_cached(options: &Options, posts: &[Post]) -> String {
    build_with(options, |json| {
        json.cache_collection(
            posts,
            &CacheOptions::default(),
            |post| format!("post/{}", post.id),
            |json, post| {
                json.object(|json| {
                    json.set("id", post.id)?;
                    json.set("title", post.title.as_str())
                })
            },
        )
    })
    .expect("render")
}

fn bench_backends(c: &mut Criterion) {
    let data = posts(1_000);
    let buffered = Options {
        backend: Backend::Buffered,
        ..Options::default()
    };
    let serde_json_backed = Options {
        backend: Backend::SerdeJson,
        ..Options::default()
    };
    c.bench_function("build_1k_buffered", |b| {
        b.iter(|| black_box(render(&buffered, &data)))
    });
    c.bench_function("build_1k_serde_json", |b| {
        b.iter(|| black_box(render(&serde_json_backed, &data)))
    });
}

fn bench_cache_collection(c: &mut Criterion) {
    let data = posts(200);
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let options = Options {
        cache: Some(Arc::clone(&store)),
        ..Options::default()
    };
    // First render populates the store; the benchmark measures warm replay.
    render_cached(&options, &data);
    c.bench_function("cache_collection_200_warm", |b| {
        b.iter(|| black_box(render_cached(&options, &data)))
    });
}

criterion_group!(benches, bench_backends, bench_cache_collection);
criterion_main!(benches);
