//! Error types for Siphon

use thiserror::Error;

/// Siphon error types
#[derive(Debug, Error)]
pub enum SiphonError {
    /// An invalid or missing configuration option, detected before any I/O.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The source reference could not be resolved or opened.
    #[error("source '{reference}' unavailable: {cause}")]
    SourceUnavailable {
        /// Logical reference of the source that failed to open.
        reference: String,
        /// Underlying cause.
        cause: String,
    },
    /// Malformed source content.
    #[error("decode error at byte {offset}: {cause}")]
    Decode {
        /// Byte offset in the source stream where decoding failed.
        offset: u64,
        /// Human-readable cause.
        cause: String,
    },
    /// A value has no representation in the target format.
    #[error("encode error at record {record_index}: {cause}")]
    Encode {
        /// Zero-based index of the record that failed to encode.
        record_index: u64,
        /// Human-readable cause.
        cause: String,
    },
    /// The staged file could not be handed to durable storage.
    #[error("persist error: {0}")]
    Persist(String),
    /// The run was aborted by an external cancellation signal.
    #[error("conversion cancelled")]
    Cancelled,
    /// I/O operation failed while reading the source or writing staged output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SiphonError {
    /// Build a decode error at a byte offset.
    pub fn decode(offset: u64, cause: impl Into<String>) -> Self {
        SiphonError::Decode {
            offset,
            cause: cause.into(),
        }
    }

    /// Build an encode error for a record index.
    pub fn encode(record_index: u64, cause: impl Into<String>) -> Self {
        SiphonError::Encode {
            record_index,
            cause: cause.into(),
        }
    }

    /// Re-anchor a decode error produced by an offset-unaware scalar parser.
    ///
    /// Non-decode errors pass through unchanged.
    pub fn at_offset(self, offset: u64) -> Self {
        match self {
            SiphonError::Decode { cause, .. } => SiphonError::Decode { offset, cause },
            other => other,
        }
    }

    /// Re-anchor an encode error once the caller knows the record index.
    ///
    /// Non-encode errors pass through unchanged.
    pub fn at_record(self, record_index: u64) -> Self {
        match self {
            SiphonError::Encode { cause, .. } => SiphonError::Encode {
                record_index,
                cause,
            },
            other => other,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SiphonError>;
