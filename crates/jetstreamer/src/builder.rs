//! The public build DSL and its container-stack state machine.

use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheOptions, CacheStore};
use crate::encode::{ContainerKind, Encoder, Fragment, OutputSink};
use crate::error::{Error, Result, StructuralError};
use crate::key_format::{KeyFormatter, Transform};
use crate::options::Options;
use crate::record::{FieldValue, Record};
use crate::value::Scalar;

/// Forward-only streaming JSON builder. One instance per document, used from
/// a single thread of control from construction through [`Builder::finish`].
///
/// ```
/// # fn main() -> jetstreamer::Result<()> {
/// let mut json = jetstreamer::Builder::new();
/// json.object(|json| {
///     json.set("title", "hello")?;
///     json.set("count", 2)
/// })?;
/// assert_eq!(json.finish()?, r#"{"title":"hello","count":2}"#);
/// # Ok(())
/// # }
/// ```
pub struct Builder {
    encoder: Box<dyn Encoder>,
    formatter: Rc<KeyFormatter>,
    ignore_nil: bool,
    store: Option<Arc<dyn CacheStore>>,
}

impl Builder {
    pub fn new() -> Self {
        Builder::with_options(&Options::default())
    }

    pub fn with_options(options: &Options) -> Self {
        Builder::with_sink(options, OutputSink::buffer())
    }

    /// Builder writing through to a caller-supplied sink instead of an
    /// in-memory buffer; retrieve it back with [`Builder::finish_sink`].
    pub fn with_sink(options: &Options, sink: OutputSink) -> Self {
        Builder::with_encoder(options, options.backend.make(sink))
    }

    /// Builder on an explicit encoder, for custom [`Encoder`] impls.
    pub fn with_encoder(options: &Options, encoder: Box<dyn Encoder>) -> Self {
        Builder {
            encoder,
            formatter: Rc::new(options.key_formatter.clone()),
            ignore_nil: options.ignore_nil,
            store: options.cache.clone(),
        }
    }

    /// Write a key in the current object scope, applying the active key
    /// formatter.
    pub fn key(&mut self, key: &str) -> Result<()> {
        let formatted = self.formatter.format(key)?;
        self.encoder.key(&formatted)
    }

    /// Write a leaf value at the current position: the pending key's value
    /// in an object scope, the next element in an array scope, or the
    /// document itself at the top level.
    pub fn value(&mut self, value: impl Into<Scalar>) -> Result<()> {
        self.encoder.scalar(&value.into())
    }

    /// Open an object, run the block, close it. An empty block yields `{}`.
    pub fn object<F>(&mut self, block: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.encoder.open_map()?;
        self.scoped(block)?;
        self.encoder.close_map()
    }

    /// Open an array, run the block (which issues `child*` calls), close it.
    pub fn array<F>(&mut self, block: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.encoder.open_array()?;
        self.scoped(block)?;
        self.encoder.close_array()
    }

    /// Array of leaf values, one per element of the collection.
    pub fn array_of<I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Scalar>,
    {
        self.array(|json| {
            for value in values {
                json.value(value)?;
            }
            Ok(())
        })
    }

    /// Array with the block run once per element in a fresh scope. Each
    /// element's block writes the element itself; a block that writes
    /// nothing skips its element cleanly.
    pub fn array_each<I, F>(&mut self, collection: I, mut block: F) -> Result<()>
    where
        I: IntoIterator,
        F: FnMut(&mut Self, I::Item) -> Result<()>,
    {
        self.array(|json| {
            for element in collection {
                json.scoped(|json| block(json, element))?;
            }
            Ok(())
        })
    }

    /// Array with the named fields plucked off every element.
    ///
    /// ```
    /// # use std::collections::HashMap;
    /// # fn main() -> jetstreamer::Result<()> {
    /// let people = vec![
    ///     HashMap::from([("name".to_string(), "David")]),
    ///     HashMap::from([("name".to_string(), "Jamie")]),
    /// ];
    /// let mut json = jetstreamer::Builder::new();
    /// json.array_records(&people, &["name"])?;
    /// assert_eq!(json.finish()?, r#"[{"name":"David"},{"name":"Jamie"}]"#);
    /// # Ok(())
    /// # }
    /// ```
    pub fn array_records<I>(&mut self, records: I, fields: &[&str]) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Record,
    {
        self.array(|json| {
            for record in records {
                json.pluck(&record, fields)?;
            }
            Ok(())
        })
    }

    /// One array element holding a leaf value.
    pub fn child(&mut self, value: impl Into<Scalar>) -> Result<()> {
        self.value(value)
    }

    /// One array element written by the block in a fresh scope.
    pub fn child_with<F>(&mut self, block: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.scoped(block)
    }

    /// One array element: an object with the named fields plucked off the
    /// record.
    pub fn child_record<R>(&mut self, record: &R, fields: &[&str]) -> Result<()>
    where
        R: Record + ?Sized,
    {
        self.pluck(record, fields)
    }

    /// Key/value pair with a leaf value. With `ignore_nil` configured, a
    /// null value suppresses the pair entirely.
    pub fn set(&mut self, key: &str, value: impl Into<Scalar>) -> Result<()> {
        let value = value.into();
        if self.ignore_nil && value.is_null() {
            return Ok(());
        }
        self.key(key)?;
        self.encoder.scalar(&value)
    }

    /// Key whose value is written by the block (a nested object, array, or
    /// bare value) in a fresh scope.
    pub fn set_with<F>(&mut self, key: &str, block: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.key(key)?;
        self.scoped(block)
    }

    /// Key whose value is an object with the named fields plucked off the
    /// record.
    pub fn set_record<R>(&mut self, key: &str, record: &R, fields: &[&str]) -> Result<()>
    where
        R: Record + ?Sized,
    {
        self.key(key)?;
        self.pluck(record, fields)
    }

    /// Key whose value is an array of plucked objects, one per record.
    pub fn set_records<I>(&mut self, key: &str, records: I, fields: &[&str]) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Record,
    {
        self.key(key)?;
        self.array_records(records, fields)
    }

    /// Key whose value is an array built by running the block once per
    /// element.
    pub fn set_each<I, F>(&mut self, key: &str, collection: I, block: F) -> Result<()>
    where
        I: IntoIterator,
        F: FnMut(&mut Self, I::Item) -> Result<()>,
    {
        self.key(key)?;
        self.array_each(collection, block)
    }

    /// Key whose value is an array of leaf values.
    pub fn set_values<I>(&mut self, key: &str, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Scalar>,
    {
        self.key(key)?;
        self.array_of(values)
    }

    /// Write the named fields of a record as key/value pairs in the current
    /// object scope. A missing field aborts before its key is written.
    pub fn extract<R>(&mut self, record: &R, fields: &[&str]) -> Result<()>
    where
        R: Record + ?Sized,
    {
        for &field in fields {
            let Some(value) = record.field(field) else {
                return Err(Error::FieldAccess {
                    field: field.to_owned(),
                    kind: record.kind(),
                });
            };
            match value {
                FieldValue::Scalar(scalar) => {
                    if self.ignore_nil && scalar.is_null() {
                        continue;
                    }
                    self.key(field)?;
                    self.encoder.scalar(&scalar)?;
                }
                FieldValue::Serialized(json) => {
                    self.key(field)?;
                    self.encoder.raw(&json)?;
                }
            }
        }
        Ok(())
    }

    /// `extract` wrapped in its own object scope.
    pub fn pluck<R>(&mut self, record: &R, fields: &[&str]) -> Result<()>
    where
        R: Record + ?Sized,
    {
        self.object(|json| json.extract(record, fields))
    }

    /// Install a new key formatter for the remainder of the current scope.
    /// Leaving any block-taking operation restores the previous formatter,
    /// so sibling keys written after a nested block are unaffected.
    pub fn key_format<I>(&mut self, steps: I)
    where
        I: IntoIterator<Item = Transform>,
    {
        self.formatter = Rc::new(KeyFormatter::new(steps));
    }

    /// Record the block's output as a free-standing [`Fragment`] instead of
    /// writing it to the live stream. The block runs against a detached
    /// frame mirroring the current container, so its separator bookkeeping
    /// starts fresh and the fragment comes out with no enclosing brackets
    /// and no dangling separators. When the block fails, the original sink
    /// and the container bookkeeping are both restored before the error
    /// propagates, so nothing leaks into the captured buffer's place.
    pub fn capture<F>(&mut self, block: F) -> Result<Fragment>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.encoder.flush()?;
        let outer = self.encoder.redirect(OutputSink::buffer());
        self.encoder.begin_capture();

        let run = match self.scoped(block) {
            Ok(()) => {
                let ended = self.encoder.end_capture();
                ended.and_then(|()| self.encoder.flush())
            }
            Err(e) => {
                self.encoder.abort_capture();
                Err(e)
            }
        };
        let inner = self.encoder.redirect(outer);
        run?;
        Ok(Fragment::from(inner.into_string()?))
    }

    /// Splice pre-serialized content into the stream as one logical element,
    /// with correct separator bookkeeping. The text must be self-contained:
    /// internal separators in place, no leading or trailing separator, no
    /// enclosing brackets beyond its own. An empty fragment writes nothing.
    pub fn inject(&mut self, fragment: &str) -> Result<()> {
        self.encoder.raw(fragment)
    }

    /// Write any serde-serializable value as a single element via
    /// serde_json.
    pub fn serialize<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.expect_value_position()?;
        let json = serde_json::to_string(value)?;
        self.encoder.raw(&json)
    }

    /// Embed another builder's finished document as a single value. The
    /// nested builder is consumed; its output is spliced verbatim.
    pub fn embed(&mut self, nested: Builder) -> Result<()> {
        self.expect_value_position()?;
        let document = nested.finish()?;
        self.encoder.raw(&document)
    }

    /// Fragment-cached block. Without a store configured the block simply
    /// runs inline. With one, the block's output is computed via capture at
    /// most once per key and replayed from the store afterwards; either way
    /// exactly one splice lands in the current scope.
    ///
    /// Keys are opaque to the builder; fold any digest or version data in
    /// before calling, or pass it through [`CacheOptions`] for the store to
    /// interpret.
    pub fn cache<F>(&mut self, key: &str, options: &CacheOptions, block: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let Some(store) = self.store.clone() else {
            return self.scoped(block);
        };
        let mut block = Some(block);
        let mut compute = || {
            let block = block
                .take()
                .ok_or_else(|| Error::Message("cache compute invoked twice".to_owned()))?;
            self.capture(block)
        };
        let fragment = store.fetch(key, options, &mut compute)?;
        self.inject(fragment.as_str())
    }

    /// Array of fragment-cached elements: one key per element from `key_fn`,
    /// a single batched read for all keys, then per element either the
    /// stored fragment is spliced or the block runs once, is persisted, and
    /// spliced. Exactly one store write per miss. Without a store this is
    /// plain per-element rendering.
    pub fn cache_collection<I, T, K, F>(
        &mut self,
        collection: I,
        options: &CacheOptions,
        key_fn: K,
        mut block: F,
    ) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        K: Fn(&T) -> String,
        F: FnMut(&mut Self, &T) -> Result<()>,
    {
        let elements: Vec<T> = collection.into_iter().collect();
        let Some(store) = self.store.clone() else {
            return self.array_each(elements.iter(), |json, element| block(json, element));
        };

        let keys: Vec<String> = elements.iter().map(&key_fn).collect();
        let hits = store.read_multi(&keys, options)?;
        self.array(|json| {
            for (element, key) in elements.iter().zip(&keys) {
                if let Some(hit) = hits.get(key) {
                    json.inject(hit.as_str())?;
                } else {
                    let fragment = json.capture(|json| block(json, element))?;
                    store.write(key, &fragment, options)?;
                    json.inject(fragment.as_str())?;
                }
            }
            Ok(())
        })
    }

    /// Flush and return the document. Errors if any container is still open
    /// or the output went to an external writer sink.
    pub fn finish(self) -> Result<String> {
        self.finish_sink()?.into_string()
    }

    /// Flush and surrender the sink, for writer-backed builders.
    pub fn finish_sink(self) -> Result<OutputSink> {
        let open = self.encoder.depth();
        if open > 0 {
            return Err(Error::Structural(StructuralError::UnclosedContainers {
                open,
            }));
        }
        self.encoder.into_sink()
    }

    /// Run a block with the current formatter saved and restored around it,
    /// error or not. This is what gives `key_format` its lexical scoping.
    fn scoped<F>(&mut self, block: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let saved = Rc::clone(&self.formatter);
        let result = block(self);
        self.formatter = saved;
        result
    }

    fn expect_value_position(&self) -> Result<()> {
        if self.encoder.top() == Some(ContainerKind::Map) && !self.encoder.has_pending_key() {
            return Err(Error::Structural(StructuralError::ValueWithoutKey));
        }
        Ok(())
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}
