use jetstreamer::{Builder, build};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn capture_mid_object_and_reinject() -> TestResult {
    let mut json = Builder::new();
    json.object(|json| {
        json.set("key1", "value1")?;
        let fragment = json.capture(|json| {
            json.set("key2", "value2")?;
            json.set("key4", "value4")
        })?;
        assert_eq!(fragment.as_str(), r#""key2":"value2","key4":"value4""#);
        json.inject(fragment.as_str())?;
        json.set("key3", "value3")
    })?;
    assert_eq!(
        json.finish()?,
        r#"{"key1":"value1","key2":"value2","key4":"value4","key3":"value3"}"#
    );
    Ok(())
}

#[test]
fn capture_then_inject_is_transparent() -> TestResult {
    let direct = build(|json| {
        json.object(|json| {
            json.set("a", 1)?;
            json.set("b", 2)?;
            json.set("c", 3)
        })
    })?;

    let spliced = build(|json| {
        json.object(|json| {
            json.set("a", 1)?;
            let fragment = json.capture(|json| {
                json.set("b", 2)?;
                json.set("c", 3)
            })?;
            json.inject(fragment.as_str())
        })
    })?;

    assert_eq!(direct, spliced);
    Ok(())
}

#[test]
fn empty_capture_yields_empty_fragment() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            json.set("a", 1)?;
            let fragment = json.capture(|_| Ok(()))?;
            assert!(fragment.is_empty());
            json.inject(fragment.as_str())?;
            json.set("b", 2)
        })
    })?;
    assert_eq!(out, r#"{"a":1,"b":2}"#);
    Ok(())
}

#[test]
fn capture_inside_array() -> TestResult {
    let out = build(|json| {
        json.array(|json| {
            json.child(1)?;
            let fragment = json.capture(|json| {
                json.child(2)?;
                json.child(3)
            })?;
            assert_eq!(fragment.as_str(), "2,3");
            json.inject(fragment.as_str())?;
            json.child(4)
        })
    })?;
    assert_eq!(out, "[1,2,3,4]");
    Ok(())
}

#[test]
fn top_level_capture_holds_a_whole_document() -> TestResult {
    let mut json = Builder::new();
    let fragment = json.capture(|json| {
        json.object(|json| json.set("name", "Cache"))
    })?;
    assert_eq!(fragment.as_str(), r#"{"name":"Cache"}"#);
    json.inject(fragment.as_str())?;
    assert_eq!(json.finish()?, r#"{"name":"Cache"}"#);
    Ok(())
}

#[test]
fn nested_captures() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            let outer = json.capture(|json| {
                json.set("a", 1)?;
                let inner = json.capture(|json| json.set("b", 2))?;
                assert_eq!(inner.as_str(), r#""b":2"#);
                json.inject(inner.as_str())
            })?;
            assert_eq!(outer.as_str(), r#""a":1,"b":2"#);
            json.inject(outer.as_str())
        })
    })?;
    assert_eq!(out, r#"{"a":1,"b":2}"#);
    Ok(())
}

#[test]
fn inject_external_text_as_document() -> TestResult {
    let out = build(|json| json.inject(r#"{"foo":"bar"}"#))?;
    assert_eq!(out, r#"{"foo":"bar"}"#);
    Ok(())
}

#[test]
fn inject_pairs_into_object_scope() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            json.set("attr1", "value1")?;
            json.inject(r#""name":"Pavel","age":30"#)?;
            json.set("attr2", "value2")
        })
    })?;
    assert_eq!(
        out,
        r#"{"attr1":"value1","name":"Pavel","age":30,"attr2":"value2"}"#
    );
    Ok(())
}

#[test]
fn inject_first_pair_into_object_scope() -> TestResult {
    let out = build(|json| {
        json.object(|json| json.inject(r#""foo":"bar""#))
    })?;
    assert_eq!(out, r#"{"foo":"bar"}"#);
    Ok(())
}

#[test]
fn inject_value_for_a_pending_key() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            json.key("author")?;
            json.inject(r#"{"name":"Pavel"}"#)
        })
    })?;
    assert_eq!(out, r#"{"author":{"name":"Pavel"}}"#);
    Ok(())
}

#[test]
fn inject_empty_fragment_is_a_noop() -> TestResult {
    let out = build(|json| {
        json.array(|json| {
            json.inject("")?;
            json.child(1)?;
            json.inject("")?;
            json.child(2)
        })
    })?;
    assert_eq!(out, "[1,2]");
    Ok(())
}

#[test]
fn failing_captured_block_restores_sink_and_bookkeeping() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            json.set("a", 1)?;
            // A bare value in object scope is a structural error; the
            // capture restores the live sink and the container state
            // before reporting it.
            let captured = json.capture(|json| json.value(2));
            assert!(captured.is_err());
            json.set("b", 2)
        })
    })?;
    assert_eq!(out, r#"{"a":1,"b":2}"#);
    Ok(())
}
