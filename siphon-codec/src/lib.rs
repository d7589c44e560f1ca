//! Siphon Codec - Decoder/encoder engines
//!
//! This crate provides the format engines for Siphon:
//!
//! - Lazy record streams over source formats (interchange notation, JSON
//!   lines)
//! - Per-record encoders for target formats (JSON lines, CSV)
//! - The annotation policy applied between the two

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod annotations;
pub mod decode;
pub mod encode;

// Re-export commonly used types
pub use siphon_format::{
    Charset, Decimal, Limits, Result, SiphonError, Timestamp, TimestampPrecision, Value,
};

// Re-export our own types
pub use annotations::AnnotationPolicy;
pub use decode::{IonReader, JsonLinesReader, RecordStream, SourceFormat};
pub use encode::{CsvEncoder, EncodeOptions, Encoder, JsonLinesEncoder, TargetFormat};
