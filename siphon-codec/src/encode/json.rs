//! JSON Lines encoder

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;

use siphon_format::{Result, SiphonError, Value};

use super::EncodeOptions;

/// Field name carrying the annotation list when wrappers are kept.
const ANNOTATIONS_FIELD: &str = "ion_annotations";
/// Field name carrying the wrapped value when wrappers are kept.
const VALUE_FIELD: &str = "value";

/// Encoder for newline-delimited JSON
///
/// Each record becomes one compact JSON value followed by exactly one line
/// delimiter sequence. The delimiter/header options of the shared
/// configuration surface are validated no-ops here.
pub struct JsonLinesEncoder {
    line_delimiter: String,
}

impl JsonLinesEncoder {
    /// Build from validated options.
    pub fn new(opts: &EncodeOptions) -> Self {
        Self {
            line_delimiter: opts.line_delimiter.clone(),
        }
    }

    /// Encode one record as a JSON line.
    pub fn encode(&mut self, value: &Value, record_index: u64) -> Result<Bytes> {
        let json = to_json(value, record_index)?;
        let mut buf = serde_json::to_vec(&json)
            .map_err(|e| SiphonError::encode(record_index, format!("JSON serialization: {e}")))?;
        buf.extend_from_slice(self.line_delimiter.as_bytes());
        Ok(Bytes::from(buf))
    }

    /// JSON lines have no trailer.
    pub fn finish(&mut self) -> Result<Option<Bytes>> {
        Ok(None)
    }
}

/// Convert a model value into a JSON value.
///
/// Struct field order is preserved; exact decimals become JSON numbers
/// without a float round-trip; any annotation wrapper still present after
/// the annotation policy is rendered as the two-field wrapper object.
fn to_json(value: &Value, record_index: u64) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => {
            let number = serde_json::Number::from_f64(*f).ok_or_else(|| {
                SiphonError::encode(
                    record_index,
                    format!("float {f} has no JSON representation"),
                )
            })?;
            serde_json::Value::Number(number)
        }
        Value::Decimal(d) => {
            serde_json::Value::Number(serde_json::Number::from_string_unchecked(
                d.to_json_string(),
            ))
        }
        Value::Timestamp(ts) => serde_json::Value::String(ts.to_text()),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Blob(bytes) => serde_json::Value::String(BASE64.encode(bytes)),
        Value::List(items) => {
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                array.push(to_json(item, record_index)?);
            }
            serde_json::Value::Array(array)
        }
        Value::Struct(fields) => {
            let mut map = serde_json::Map::with_capacity(fields.len());
            for (name, field_value) in fields {
                map.insert(name.clone(), to_json(field_value, record_index)?);
            }
            serde_json::Value::Object(map)
        }
        Value::Annotated { annotations, value } => {
            let mut map = serde_json::Map::with_capacity(2);
            map.insert(
                ANNOTATIONS_FIELD.to_string(),
                serde_json::Value::Array(
                    annotations
                        .iter()
                        .map(|a| serde_json::Value::String(a.clone()))
                        .collect(),
                ),
            );
            map.insert(VALUE_FIELD.to_string(), to_json(value, record_index)?);
            serde_json::Value::Object(map)
        }
    })
}
