use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::encode::Fragment;
use crate::error::{Error, Result};

/// Passthrough bag handed to the store with every call. The builder does not
/// interpret any of it; expiry and version folding are store policy.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    pub expires_in: Option<Duration>,
    pub version: Option<String>,
}

/// Fragment store contract. Stores may be shared by concurrent renders, so
/// implementations provide their own synchronization. Store failures
/// propagate as `CacheBackend` errors; they are never downgraded to misses.
pub trait CacheStore: Send + Sync {
    fn read(&self, key: &str, options: &CacheOptions) -> Result<Option<Fragment>>;

    fn write(&self, key: &str, fragment: &Fragment, options: &CacheOptions) -> Result<()>;

    /// Batched read. Missing keys are simply absent from the result.
    fn read_multi(
        &self,
        keys: &[String],
        options: &CacheOptions,
    ) -> Result<HashMap<String, Fragment>> {
        let mut hits = HashMap::new();
        for key in keys {
            if let Some(fragment) = self.read(key, options)? {
                hits.insert(key.clone(), fragment);
            }
        }
        Ok(hits)
    }

    /// Read-through fetch: on a hit the stored fragment is returned and
    /// `compute` never runs; on a miss `compute` runs exactly once and its
    /// result is persisted before being returned.
    fn fetch(
        &self,
        key: &str,
        options: &CacheOptions,
        compute: &mut dyn FnMut() -> Result<Fragment>,
    ) -> Result<Fragment> {
        if let Some(hit) = self.read(key, options)? {
            return Ok(hit);
        }
        let fragment = compute()?;
        self.write(key, &fragment, options)?;
        Ok(fragment)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    fragment: Fragment,
    expires_at: Option<Instant>,
}

/// In-memory reference store. Honors `expires_in`; share across renders via
/// `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| Error::CacheBackend("memory store mutex poisoned".to_owned()))
    }
}

impl CacheStore for MemoryStore {
    fn read(&self, key: &str, _options: &CacheOptions) -> Result<Option<Fragment>> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        let expired = matches!(
            entries.get(key),
            Some(entry) if entry.expires_at.is_some_and(|at| at <= now)
        );
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|entry| entry.fragment.clone()))
    }

    fn write(&self, key: &str, fragment: &Fragment, options: &CacheOptions) -> Result<()> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_owned(),
            Entry {
                fragment: fragment.clone(),
                expires_at: options.expires_in.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    fn read_multi(
        &self,
        keys: &[String],
        _options: &CacheOptions,
    ) -> Result<HashMap<String, Fragment>> {
        // One lock acquisition for the whole batch.
        let mut entries = self.lock()?;
        let now = Instant::now();
        let mut hits = HashMap::new();
        for key in keys {
            let expired = matches!(
                entries.get(key),
                Some(entry) if entry.expires_at.is_some_and(|at| at <= now)
            );
            if expired {
                entries.remove(key);
                continue;
            }
            if let Some(entry) = entries.get(key) {
                hits.insert(key.clone(), entry.fragment.clone());
            }
        }
        Ok(hits)
    }
}
