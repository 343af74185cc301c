use jetstreamer::{Builder, Options, Scalar, build, build_with};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn single_pair() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            json.key("content")?;
            json.value("hello")
        })
    })?;
    assert_eq!(out, r#"{"content":"hello"}"#);
    Ok(())
}

#[test]
fn multiple_pairs_in_call_order() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            json.set("title", "hello")?;
            json.set("content", "world")
        })
    })?;
    assert_eq!(out, r#"{"title":"hello","content":"world"}"#);
    Ok(())
}

#[test]
fn empty_object() -> TestResult {
    let out = build(|json| json.object(|_| Ok(())))?;
    assert_eq!(out, "{}");
    Ok(())
}

#[test]
fn scalar_value_types() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            json.set("int", -3)?;
            json.set("big", u64::MAX)?;
            json.set("float", 2.5)?;
            json.set("yes", true)?;
            json.set("no", false)?;
            json.set("none", Scalar::Null)?;
            json.set("opt", None::<i64>)?;
            json.set("text", String::from("owned"))
        })
    })?;
    assert_eq!(
        out,
        r#"{"int":-3,"big":18446744073709551615,"float":2.5,"yes":true,"no":false,"none":null,"opt":null,"text":"owned"}"#
    );
    Ok(())
}

#[test]
fn set_with_block_value() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            json.set_with("answer", |json| json.value(10))?;
            json.set_with("author", |json| {
                json.object(|json| json.set("name", "David"))
            })
        })
    })?;
    assert_eq!(out, r#"{"answer":10,"author":{"name":"David"}}"#);
    Ok(())
}

#[test]
fn set_values_and_each() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            json.set_values("tags", ["a", "b"])?;
            json.set_each("comments", 0..2, |json, id| {
                json.object(|json| json.set("id", id))
            })
        })
    })?;
    assert_eq!(
        out,
        r#"{"tags":["a","b"],"comments":[{"id":0},{"id":1}]}"#
    );
    Ok(())
}

#[test]
fn top_level_scalar_documents() -> TestResult {
    assert_eq!(build(|json| json.value("string"))?, r#""string""#);
    assert_eq!(build(|json| json.value(1))?, "1");
    assert_eq!(build(|json| json.value(true))?, "true");
    assert_eq!(build(|json| json.value(Scalar::Null))?, "null");
    Ok(())
}

#[test]
fn nothing_written_finishes_empty() -> TestResult {
    let json = Builder::new();
    assert_eq!(json.finish()?, "");
    Ok(())
}

#[test]
fn key_order_survives_parsing() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            json.set("zebra", 1)?;
            json.set("apple", 2)?;
            json.set("mango", 3)
        })
    })?;
    let parsed: serde_json::Value = serde_json::from_str(&out)?;
    let keys: Vec<&str> = parsed
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, ["zebra", "apple", "mango"]);
    Ok(())
}

#[test]
fn ignore_nil_suppresses_null_pairs() -> TestResult {
    let options = Options {
        ignore_nil: true,
        ..Options::default()
    };
    let out = build_with(&options, |json| {
        json.object(|json| {
            json.set("kept", 1)?;
            json.set("dropped", None::<&str>)?;
            json.set("also_kept", "x")
        })
    })?;
    assert_eq!(out, r#"{"kept":1,"also_kept":"x"}"#);

    // Explicit values and array elements are not affected.
    let out = build_with(&options, |json| {
        json.array_of([Scalar::Null, Scalar::from(1)])
    })?;
    assert_eq!(out, "[null,1]");
    Ok(())
}
