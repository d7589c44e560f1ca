//! Siphon I/O - Streaming conversion pipeline and collaborators
//!
//! This crate wires the codec engines into a complete run:
//!
//! - The conversion pipeline with its bounded decode→write handoff
//! - The staging sink for durable-enough local output
//! - Collaborator interfaces for source resolution, durable storage, and
//!   metrics, with local implementations

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod source;
pub mod staging;
pub mod storage;

// Re-export commonly used types
pub use siphon_codec::{
    AnnotationPolicy, EncodeOptions, Encoder, Limits, RecordStream, SourceFormat, TargetFormat,
};
pub use siphon_format::{Charset, Result, SiphonError, Value};

pub use config::{ConvertOptions, DEFAULT_QUEUE_CAPACITY};
pub use metrics::{CollectingMetrics, LogMetrics, MetricsSink, RECORDS_COUNTER};
pub use pipeline::CancelToken;
pub use source::{FileResolver, SourceResolver};
pub use staging::StagingFile;
pub use storage::{LocalFileStore, StorageSink};

/// Everything one conversion run needs
pub struct ConvertRequest<'a> {
    /// Run configuration
    pub options: ConvertOptions,
    /// Resolves the `from` reference to a byte stream
    pub resolver: &'a dyn SourceResolver,
    /// Receives the completed staging file
    pub storage: &'a dyn StorageSink,
    /// Receives the record count after a successful run
    pub metrics: &'a dyn MetricsSink,
    /// External cancellation signal
    pub cancel: CancelToken,
}

/// Result of a successful conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Permanent reference returned by the storage sink
    pub output: String,
    /// Number of records converted
    pub records: u64,
    /// Bytes written to the staged output
    pub bytes_staged: u64,
}

/// Convert one source stream into the target format.
///
/// Decodes lazily, applies the annotation policy, encodes record by record
/// into a staged local file, hands the file to the storage sink, and
/// reports the record count. Single-pass, with bounded memory.
pub fn convert(request: ConvertRequest<'_>) -> Result<ConvertSummary> {
    pipeline::execute(request)
}
