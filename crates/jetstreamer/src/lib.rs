#![doc = include_str!("../README.md")]

pub mod builder;
pub mod cache;
pub mod encode;
pub mod error;
pub mod key_format;
pub mod options;
pub mod record;
pub mod value;

pub use crate::builder::Builder;
pub use crate::cache::{CacheOptions, CacheStore, MemoryStore};
pub use crate::encode::{ContainerKind, Encoder, Fragment, OutputSink};
pub use crate::error::{Error, Result, StructuralError};
pub use crate::key_format::{CaseStyle, KeyFormatter, Transform};
pub use crate::options::{Backend, Options};
pub use crate::record::{FieldValue, Record, RecordKind};
pub use crate::value::{Number, Scalar};

use std::io::Write;

/// Build one document with a fresh default builder.
pub fn build<F>(block: F) -> Result<String>
where
    F: FnOnce(&mut Builder) -> Result<()>,
{
    build_with(&Options::default(), block)
}

/// Build one document with the given configuration.
pub fn build_with<F>(options: &Options, block: F) -> Result<String>
where
    F: FnOnce(&mut Builder) -> Result<()>,
{
    let mut json = Builder::with_options(options);
    block(&mut json)?;
    json.finish()
}

/// Build one document straight into a writer.
pub fn build_to_writer<W, F>(writer: W, options: &Options, block: F) -> Result<()>
where
    W: Write + 'static,
    F: FnOnce(&mut Builder) -> Result<()>,
{
    let mut json = Builder::with_sink(options, OutputSink::writer(writer));
    block(&mut json)?;
    json.finish_sink()?;
    Ok(())
}
