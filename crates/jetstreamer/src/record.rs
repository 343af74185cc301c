use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde_json::Value;

use crate::value::{Number, Scalar};

/// How a record resolves fields; reported in field-access diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Key lookup by name.
    Map,
    /// Named zero-argument accessor dispatch.
    Accessor,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Map => f.write_str("map"),
            RecordKind::Accessor => f.write_str("accessor"),
        }
    }
}

/// A field value as the builder writes it: a plain scalar, or compound
/// content already serialized to JSON text and spliced in verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    Serialized(String),
}

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        FieldValue::Scalar(value)
    }
}

/// Anything `extract`/`pluck` can pull named fields from. A missing field is
/// a `FieldAccess` error carrying the field name and the record's kind.
///
/// Struct-backed records implement this directly:
///
/// ```
/// use jetstreamer::{FieldValue, Record, RecordKind};
///
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// impl Record for Person {
///     fn kind(&self) -> RecordKind {
///         RecordKind::Accessor
///     }
///
///     fn field(&self, name: &str) -> Option<FieldValue> {
///         match name {
///             "name" => Some(FieldValue::Scalar(self.name.as_str().into())),
///             "age" => Some(FieldValue::Scalar(self.age.into())),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Record {
    fn kind(&self) -> RecordKind;
    fn field(&self, name: &str) -> Option<FieldValue>;
}

impl<R: Record + ?Sized> Record for &R {
    fn kind(&self) -> RecordKind {
        (**self).kind()
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        (**self).field(name)
    }
}

impl<V: Clone + Into<Scalar>> Record for HashMap<String, V> {
    fn kind(&self) -> RecordKind {
        RecordKind::Map
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name)
            .map(|v| FieldValue::Scalar(v.clone().into()))
    }
}

impl<V: Clone + Into<Scalar>> Record for BTreeMap<String, V> {
    fn kind(&self) -> RecordKind {
        RecordKind::Map
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name)
            .map(|v| FieldValue::Scalar(v.clone().into()))
    }
}

impl Record for serde_json::Map<String, Value> {
    fn kind(&self) -> RecordKind {
        RecordKind::Map
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).map(json_field)
    }
}

impl Record for Value {
    fn kind(&self) -> RecordKind {
        RecordKind::Map
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        self.as_object().and_then(|m| m.get(name)).map(json_field)
    }
}

fn json_field(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Scalar(Scalar::Null),
        Value::Bool(b) => FieldValue::Scalar(Scalar::Bool(*b)),
        Value::Number(n) => FieldValue::Scalar(Scalar::Number(json_number(n))),
        Value::String(s) => FieldValue::Scalar(Scalar::String(s.clone())),
        Value::Array(_) | Value::Object(_) => FieldValue::Serialized(
            serde_json::to_string(value).expect("serde_json::Value serialization is infallible"),
        ),
    }
}

fn json_number(n: &serde_json::Number) -> Number {
    if let Some(v) = n.as_i64() {
        Number::I64(v)
    } else if let Some(v) = n.as_u64() {
        Number::U64(v)
    } else {
        Number::F64(n.as_f64().unwrap_or(f64::NAN))
    }
}
