use std::fmt;
use std::sync::Arc;

use crate::cache::CacheStore;
use crate::encode::buffered::BufferedEncoder;
use crate::encode::serde_json::SerdeJsonEncoder;
use crate::encode::{Encoder, OutputSink};
use crate::key_format::KeyFormatter;

/// Encoder backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Self-contained writer with an internal buffer.
    #[default]
    Buffered,
    /// Wraps serde_json's low-level `Formatter`.
    SerdeJson,
}

impl Backend {
    pub(crate) fn make(self, sink: OutputSink) -> Box<dyn Encoder> {
        match self {
            Backend::Buffered => Box::new(BufferedEncoder::new(sink)),
            Backend::SerdeJson => Box::new(SerdeJsonEncoder::new(sink)),
        }
    }
}

/// Builder configuration. An immutable snapshot: cloned into each new
/// `Builder` at construction, never mutated by per-builder calls (the
/// template `key_formatter` in particular seeds builders with a fresh memo
/// each time).
#[derive(Clone, Default)]
pub struct Options {
    pub backend: Backend,
    pub key_formatter: KeyFormatter,
    /// Skip `set`/`extract` pairs whose value resolves to null.
    pub ignore_nil: bool,
    /// Store used by `cache`/`cache_collection`; with none configured those
    /// operations run their blocks inline, uncached.
    pub cache: Option<Arc<dyn CacheStore>>,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("backend", &self.backend)
            .field("key_formatter", &self.key_formatter)
            .field("ignore_nil", &self.ignore_nil)
            .field("cache", &self.cache.is_some())
            .finish()
    }
}
