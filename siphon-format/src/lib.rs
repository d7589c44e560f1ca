//! Siphon Format - Core primitives for record-format conversion
//!
//! This crate provides the shared building blocks for the Siphon pipeline
//! with no I/O dependencies. It includes:
//!
//! - The generic value model for decoded records
//! - Exact decimal and precision-carrying timestamp scalars
//! - Character set names and transcoding
//! - Error types
//! - Decode safety limits

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod charset;
pub mod decimal;
pub mod error;
pub mod limits;
pub mod timestamp;
pub mod value;

// Re-export commonly used types
pub use charset::Charset;
pub use decimal::Decimal;
pub use error::{Result, SiphonError};
pub use limits::Limits;
pub use timestamp::{Timestamp, TimestampPrecision};
pub use value::Value;
