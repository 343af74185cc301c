use std::collections::HashMap;

use jetstreamer::{Scalar, build};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn children_in_order() -> TestResult {
    let out = build(|json| {
        json.array(|json| {
            json.child(1)?;
            json.child(2)
        })
    })?;
    assert_eq!(out, "[1,2]");
    Ok(())
}

#[test]
fn empty_array() -> TestResult {
    assert_eq!(build(|json| json.array(|_| Ok(())))?, "[]");
    assert_eq!(build(|json| json.array_of(Vec::<i64>::new()))?, "[]");
    Ok(())
}

#[test]
fn array_of_scalars() -> TestResult {
    let out = build(|json| {
        json.array_of([
            Scalar::Null,
            Scalar::from(1),
            Scalar::from(true),
            Scalar::from("string"),
        ])
    })?;
    assert_eq!(out, r#"[null,1,true,"string"]"#);
    Ok(())
}

#[test]
fn array_each_builds_one_element_per_item() -> TestResult {
    let out = build(|json| {
        json.array_each(["hello", "world"], |json, word| {
            json.object(|json| json.set("content", word))
        })
    })?;
    assert_eq!(out, r#"[{"content":"hello"},{"content":"world"}]"#);
    Ok(())
}

#[test]
fn array_each_element_can_skip_itself() -> TestResult {
    let out = build(|json| {
        json.array_each(0..6, |json, n| {
            if n % 2 == 0 {
                json.value(n)
            } else {
                // Writing nothing drops the element without disturbing
                // the surrounding separators.
                Ok(())
            }
        })
    })?;
    assert_eq!(out, "[0,2,4]");
    Ok(())
}

#[test]
fn nested_arrays_via_child_with() -> TestResult {
    let out = build(|json| {
        json.array(|json| {
            json.child_with(|json| json.array_of([1, 2]))?;
            json.child_with(|json| json.array_of([3]))
        })
    })?;
    assert_eq!(out, "[[1,2],[3]]");
    Ok(())
}

#[test]
fn array_records_plucks_fields() -> TestResult {
    let people = [
        HashMap::from([("name".to_string(), "David")]),
        HashMap::from([("name".to_string(), "Jamie")]),
    ];
    let out = build(|json| json.array_records(&people, &["name"]))?;
    assert_eq!(out, r#"[{"name":"David"},{"name":"Jamie"}]"#);
    Ok(())
}

#[test]
fn child_record_inside_block_array() -> TestResult {
    let person = HashMap::from([("name".to_string(), "Jon")]);
    let out = build(|json| {
        json.array(|json| {
            json.child(0)?;
            json.child_record(&person, &["name"])
        })
    })?;
    assert_eq!(out, r#"[0,{"name":"Jon"}]"#);
    Ok(())
}

#[test]
fn objects_inside_named_array() -> TestResult {
    let out = build(|json| {
        json.object(|json| {
            json.set_each("comments", ["hello", "world"], |json, content| {
                json.object(|json| json.set("content", content))
            })
        })
    })?;
    assert_eq!(
        out,
        r#"{"comments":[{"content":"hello"},{"content":"world"}]}"#
    );
    Ok(())
}
