//! Encoder engines
//!
//! Encoders mirror the decoder side: a closed set of target-format variants
//! behind one uniform contract, so the pipeline's configuration surface is
//! format-independent. Each call to [`Encoder::encode`] returns the bytes to
//! append for one record (including any lazily emitted one-time header);
//! [`Encoder::finish`] returns an optional trailer chunk.

pub mod csv;
pub mod json;

use bytes::Bytes;

use siphon_format::{Result, SiphonError, Value};

pub use self::csv::CsvEncoder;
pub use self::json::JsonLinesEncoder;

/// Target formats the engine can encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    /// Newline-delimited JSON
    JsonLines,
    /// Delimited tabular text
    Csv,
}

impl TargetFormat {
    /// Resolve a configuration name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jsonl" | "ndjson" | "json-lines" => Ok(TargetFormat::JsonLines),
            "csv" => Ok(TargetFormat::Csv),
            _ => Err(SiphonError::Config(format!(
                "unknown target format '{name}'"
            ))),
        }
    }

    /// Canonical name of this format.
    pub fn name(&self) -> &'static str {
        match self {
            TargetFormat::JsonLines => "jsonl",
            TargetFormat::Csv => "csv",
        }
    }
}

/// Textual conventions for the target format.
///
/// The delimiter and header options only shape delimited/tabular targets;
/// line-oriented JSON accepts and validates them as no-ops so every format
/// sees the same configuration surface.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Emit a header row before the first record (tabular targets)
    pub header: bool,
    /// Field separator character (tabular targets)
    pub field_separator: char,
    /// Text delimiter (quote) character (tabular targets)
    pub text_delimiter: char,
    /// Record terminator sequence
    pub line_delimiter: String,
    /// Quote every text field, not just the ones that need it
    pub always_delimit_text: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            header: true,
            field_separator: ',',
            text_delimiter: '"',
            line_delimiter: "\n".to_string(),
            always_delimit_text: false,
        }
    }
}

impl EncodeOptions {
    /// Validate the options for a target format.
    ///
    /// The shared checks run for every format; the CSV terminator
    /// restriction applies only there.
    pub fn validate(&self, format: TargetFormat) -> Result<()> {
        if self.field_separator == '\0' {
            return Err(SiphonError::Config(
                "field separator must not be the NUL character".into(),
            ));
        }
        if self.text_delimiter == '\0' {
            return Err(SiphonError::Config(
                "text delimiter must not be the NUL character".into(),
            ));
        }
        if !self.field_separator.is_ascii() || !self.text_delimiter.is_ascii() {
            return Err(SiphonError::Config(
                "field separator and text delimiter must be ASCII characters".into(),
            ));
        }
        if self.field_separator == self.text_delimiter {
            return Err(SiphonError::Config(
                "field separator and text delimiter must differ".into(),
            ));
        }
        if self.line_delimiter.is_empty() {
            return Err(SiphonError::Config("line delimiter must not be empty".into()));
        }
        if format == TargetFormat::Csv
            && self.line_delimiter != "\r\n"
            && self.line_delimiter.len() != 1
        {
            return Err(SiphonError::Config(
                "CSV line delimiter must be one character or \"\\r\\n\"".into(),
            ));
        }
        Ok(())
    }
}

/// Encoder engine for one conversion run
pub enum Encoder {
    /// Newline-delimited JSON
    JsonLines(JsonLinesEncoder),
    /// Delimited tabular text
    Csv(CsvEncoder),
}

impl Encoder {
    /// Build the encoder for a target format, validating the options.
    pub fn new(format: TargetFormat, opts: &EncodeOptions) -> Result<Self> {
        opts.validate(format)?;
        Ok(match format {
            TargetFormat::JsonLines => Encoder::JsonLines(JsonLinesEncoder::new(opts)),
            TargetFormat::Csv => Encoder::Csv(CsvEncoder::new(opts)?),
        })
    }

    /// Encode one record into the bytes to append to the output.
    pub fn encode(&mut self, value: &Value, record_index: u64) -> Result<Bytes> {
        match self {
            Encoder::JsonLines(encoder) => encoder.encode(value, record_index),
            Encoder::Csv(encoder) => encoder.encode(value, record_index),
        }
    }

    /// Emit the trailing chunk, if the format has one.
    pub fn finish(&mut self) -> Result<Option<Bytes>> {
        match self {
            Encoder::JsonLines(encoder) => encoder.finish(),
            Encoder::Csv(encoder) => encoder.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(
            TargetFormat::from_name("jsonl").unwrap(),
            TargetFormat::JsonLines
        );
        assert_eq!(TargetFormat::from_name("CSV").unwrap(), TargetFormat::Csv);
        assert!(matches!(
            TargetFormat::from_name("avro"),
            Err(SiphonError::Config(_))
        ));
    }

    #[test]
    fn test_validation_is_uniform_across_formats() {
        let mut opts = EncodeOptions::default();
        opts.field_separator = '\0';
        for format in [TargetFormat::JsonLines, TargetFormat::Csv] {
            assert!(matches!(
                opts.validate(format),
                Err(SiphonError::Config(_))
            ));
        }

        let mut opts = EncodeOptions::default();
        opts.field_separator = '"';
        assert!(opts.validate(TargetFormat::JsonLines).is_err());
    }

    #[test]
    fn test_csv_terminator_restriction() {
        let mut opts = EncodeOptions::default();
        opts.line_delimiter = "\r\n".to_string();
        assert!(opts.validate(TargetFormat::Csv).is_ok());

        opts.line_delimiter = "abc".to_string();
        assert!(opts.validate(TargetFormat::Csv).is_err());
        // Multi-character delimiters are fine for line-oriented JSON
        assert!(opts.validate(TargetFormat::JsonLines).is_ok());
    }
}
