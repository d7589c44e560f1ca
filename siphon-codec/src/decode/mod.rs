//! Decoder engines
//!
//! Decoders are a closed set of format variants selected at job start, so
//! dispatch stays exhaustiveness-checked at compile time. Each engine turns
//! an opened byte source into a lazy, single-pass [`RecordStream`].

pub mod ion;
pub mod jsonl;

use std::io::Read;

use siphon_format::{Limits, Result, SiphonError, Value};

pub use ion::IonReader;
pub use jsonl::JsonLinesReader;

/// Source formats the engine can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// The self-describing interchange text notation
    Ion,
    /// Newline-delimited JSON
    JsonLines,
}

impl SourceFormat {
    /// Resolve a configuration name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ion" => Ok(SourceFormat::Ion),
            "jsonl" | "ndjson" | "json-lines" => Ok(SourceFormat::JsonLines),
            _ => Err(SiphonError::Config(format!(
                "unknown source format '{name}'"
            ))),
        }
    }

    /// Canonical name of this format.
    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::Ion => "ion",
            SourceFormat::JsonLines => "jsonl",
        }
    }
}

/// A finite, forward-only, single-pass sequence of decoded records.
///
/// Pulling is lazy; the source byte stream advances only as elements are
/// requested, and the stream fuses after the first error.
pub struct RecordStream<R: Read> {
    inner: Inner<R>,
}

enum Inner<R: Read> {
    Ion(IonReader<R>),
    JsonLines(JsonLinesReader<R>),
}

impl<R: Read> RecordStream<R> {
    /// Open a record stream over a byte source in the given format.
    pub fn open(format: SourceFormat, reader: R, limits: Limits) -> Self {
        let inner = match format {
            SourceFormat::Ion => Inner::Ion(IonReader::new(reader, limits)),
            SourceFormat::JsonLines => Inner::JsonLines(JsonLinesReader::new(reader, limits)),
        };
        Self { inner }
    }
}

impl<R: Read> Iterator for RecordStream<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Ion(reader) => reader.next(),
            Inner::JsonLines(reader) => reader.next(),
        }
    }
}
