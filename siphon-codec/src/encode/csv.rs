//! Delimited tabular (CSV) encoder

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use csv::{QuoteStyle, Terminator, WriterBuilder};

use siphon_format::{Result, SiphonError, Value};

use super::EncodeOptions;

/// Encoder for delimited tabular text
///
/// The column set and order come from the first record; every subsequent
/// record must carry the same fields in the same order. Nested values have
/// no tabular representation and fail the run.
pub struct CsvEncoder {
    delimiter: u8,
    quote: u8,
    quote_style: QuoteStyle,
    terminator: Terminator,
    header: bool,
    columns: Option<Vec<String>>,
}

impl CsvEncoder {
    /// Build from validated options.
    pub fn new(opts: &EncodeOptions) -> Result<Self> {
        let terminator = if opts.line_delimiter == "\r\n" {
            Terminator::CRLF
        } else {
            Terminator::Any(opts.line_delimiter.as_bytes()[0])
        };
        let quote_style = if opts.always_delimit_text {
            QuoteStyle::NonNumeric
        } else {
            QuoteStyle::Necessary
        };
        Ok(Self {
            delimiter: opts.field_separator as u8,
            quote: opts.text_delimiter as u8,
            quote_style,
            terminator,
            header: opts.header,
            columns: None,
        })
    }

    /// Encode one record as a CSV row (preceded by the one-time header row
    /// when the first record arrives and headers are enabled).
    pub fn encode(&mut self, value: &Value, record_index: u64) -> Result<Bytes> {
        let fields = match value {
            Value::Struct(fields) => fields,
            other => {
                return Err(SiphonError::encode(
                    record_index,
                    format!("CSV target requires struct records, got {}", other.type_name()),
                ));
            }
        };

        let mut buf = Vec::new();
        {
            let mut writer = WriterBuilder::new()
                .delimiter(self.delimiter)
                .quote(self.quote)
                .quote_style(self.quote_style)
                .terminator(self.terminator)
                .has_headers(false)
                .from_writer(&mut buf);

            match &self.columns {
                None => {
                    let columns: Vec<String> =
                        fields.iter().map(|(name, _)| name.clone()).collect();
                    if self.header {
                        writer.write_record(&columns).map_err(|e| {
                            SiphonError::encode(record_index, format!("header row: {e}"))
                        })?;
                    }
                    self.columns = Some(columns);
                }
                Some(columns) => {
                    let names: Vec<&str> = fields.iter().map(|(name, _)| name.as_str()).collect();
                    if names.len() != columns.len()
                        || names.iter().zip(columns.iter()).any(|(a, b)| *a != b)
                    {
                        return Err(SiphonError::encode(
                            record_index,
                            format!(
                                "record fields [{}] do not match the tabular header [{}]",
                                names.join(", "),
                                columns.join(", ")
                            ),
                        ));
                    }
                }
            }

            let mut row = Vec::with_capacity(fields.len());
            for (name, field_value) in fields {
                row.push(cell(field_value, name, record_index)?);
            }
            writer
                .write_record(&row)
                .map_err(|e| SiphonError::encode(record_index, format!("row write: {e}")))?;
            writer
                .flush()
                .map_err(|e| SiphonError::encode(record_index, format!("row flush: {e}")))?;
        }
        Ok(Bytes::from(buf))
    }

    /// CSV has no trailer.
    pub fn finish(&mut self) -> Result<Option<Bytes>> {
        Ok(None)
    }
}

/// Render one scalar cell.
fn cell(value: &Value, field: &str, record_index: u64) -> Result<String> {
    Ok(match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Decimal(d) => d.to_json_string(),
        Value::Timestamp(ts) => ts.to_text(),
        Value::String(s) => s.clone(),
        Value::Blob(bytes) => BASE64.encode(bytes),
        Value::List(_) | Value::Struct(_) | Value::Annotated { .. } => {
            return Err(SiphonError::encode(
                record_index,
                format!(
                    "field '{field}' is a {} and has no tabular representation",
                    value.type_name()
                ),
            ));
        }
    })
}
