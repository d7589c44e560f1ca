//! Run configuration for one conversion job

use std::path::PathBuf;

use siphon_codec::{EncodeOptions, SourceFormat, TargetFormat};
use siphon_format::{Charset, Limits, Result, SiphonError};

/// Default capacity of the decode→write handoff queue, in records.
///
/// The queue must be bounded so a slow writer cannot let decoded records
/// accumulate without limit; when it is full the decode side blocks until
/// the write side drains it.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Options for one conversion run
///
/// The delimiter, header, and charset options mirror the task surface of
/// the original writers; options that do not apply to the chosen target
/// format are validated and accepted as no-ops.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Source reference handed to the source resolver (required)
    pub from: String,
    /// Format of the source stream
    pub source_format: SourceFormat,
    /// Format of the output
    pub target_format: TargetFormat,
    /// Emit a header row before the first record (tabular targets)
    pub header: bool,
    /// Field separator character (tabular targets)
    pub field_separator: char,
    /// Text delimiter character (tabular targets)
    pub text_delimiter: char,
    /// Record terminator sequence
    pub line_delimiter: String,
    /// Quote every text field, not just the ones that need it
    pub always_delimit_text: bool,
    /// Output character set name
    pub charset: String,
    /// Keep annotation wrappers instead of stripping them
    pub keep_annotations: bool,
    /// Capacity of the decode→write handoff queue, in records
    pub queue_capacity: usize,
    /// Directory for the staged output file (system temp dir if unset)
    pub staging_dir: Option<PathBuf>,
    /// Decode safety limits
    pub limits: Limits,
}

impl ConvertOptions {
    /// Options for converting `from` between the given formats, with the
    /// documented defaults for everything else.
    pub fn new(
        from: impl Into<String>,
        source_format: SourceFormat,
        target_format: TargetFormat,
    ) -> Self {
        Self {
            from: from.into(),
            source_format,
            target_format,
            header: true,
            field_separator: ',',
            text_delimiter: '"',
            line_delimiter: "\n".to_string(),
            always_delimit_text: false,
            charset: "UTF-8".to_string(),
            keep_annotations: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            staging_dir: None,
            limits: Limits::default(),
        }
    }

    /// The encoder-facing subset of these options.
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            header: self.header,
            field_separator: self.field_separator,
            text_delimiter: self.text_delimiter,
            line_delimiter: self.line_delimiter.clone(),
            always_delimit_text: self.always_delimit_text,
        }
    }

    /// Validate the whole configuration surface.
    ///
    /// Runs before any I/O; a failure here never opens the source or
    /// creates a staging file.
    pub fn validate(&self) -> Result<()> {
        if self.from.trim().is_empty() {
            return Err(SiphonError::Config(
                "'from' source reference is required".into(),
            ));
        }
        Charset::from_name(&self.charset)?;
        self.encode_options().validate(self.target_format)?;
        if self.queue_capacity == 0 {
            return Err(SiphonError::Config(
                "queue capacity must be at least 1 record".into(),
            ));
        }
        Ok(())
    }
}
