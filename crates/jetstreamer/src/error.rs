use std::io;

use thiserror::Error;

use crate::encode::ContainerKind;
use crate::record::RecordKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("field `{field}` missing on {kind} record")]
    FieldAccess { field: String, kind: RecordKind },

    #[error("key format error: {0}")]
    KeyFormat(String),

    #[error("cache backend error: {0}")]
    CacheBackend(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serde_json error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),
}

/// Container-stack misuse. Always a programmer or template error; the
/// render aborts, nothing is recovered.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StructuralError {
    #[error("closed {requested} but the open container is {found}")]
    MismatchedClose {
        requested: ContainerKind,
        found: ContainerKind,
    },

    #[error("closed {requested} with no container open")]
    CloseWithoutOpen { requested: ContainerKind },

    #[error("value written in object scope with no key pending")]
    ValueWithoutKey,

    #[error("key written outside an object scope")]
    KeyOutsideObject,

    #[error("key written while another key is pending")]
    KeyAlreadyPending,

    #[error("container closed while a key is pending")]
    PendingKeyAtClose,

    #[error("document already holds a top-level value")]
    DocumentComplete,

    #[error("finish with {open} container(s) still open")]
    UnclosedContainers { open: usize },

    #[error("captured block left its containers unbalanced")]
    UnbalancedCapture,

    #[error("capture ended without a matching begin")]
    CaptureUnderflow,
}

pub type Result<T> = std::result::Result<T, Error>;
