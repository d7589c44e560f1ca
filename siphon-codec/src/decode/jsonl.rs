//! JSON Lines decoder
//!
//! One JSON document per line; blank lines are skipped. Object key order is
//! preserved into the value model.

use std::io::{BufRead, BufReader, Read};

use siphon_format::{Limits, Result, SiphonError, Value};

/// Lazy record reader for newline-delimited JSON
pub struct JsonLinesReader<R: Read> {
    reader: BufReader<R>,
    offset: u64,
    limits: Limits,
    finished: bool,
    line: String,
}

impl<R: Read> JsonLinesReader<R> {
    /// Create a reader over a byte source.
    pub fn new(reader: R, limits: Limits) -> Self {
        Self {
            reader: BufReader::new(reader),
            offset: 0,
            limits,
            finished: false,
            line: String::new(),
        }
    }

    fn next_record(&mut self) -> Result<Option<Value>> {
        loop {
            let line_start = self.offset;
            self.line.clear();
            let read = self.reader.read_line(&mut self.line).map_err(|e| {
                if e.kind() == std::io::ErrorKind::InvalidData {
                    SiphonError::decode(line_start, "line is not valid UTF-8")
                } else {
                    SiphonError::from(e)
                }
            })?;
            if read == 0 {
                return Ok(None);
            }
            self.offset += read as u64;
            if self.line.trim().is_empty() {
                continue;
            }
            let parsed: serde_json::Value =
                serde_json::from_str(self.line.trim_end()).map_err(|e| {
                    SiphonError::decode(line_start, format!("malformed JSON line: {e}"))
                })?;
            return convert(parsed, 0, line_start, &self.limits).map(Some);
        }
    }
}

impl<R: Read> Iterator for JsonLinesReader<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn convert(json: serde_json::Value, depth: usize, offset: u64, limits: &Limits) -> Result<Value> {
    if depth > limits.max_depth {
        return Err(SiphonError::decode(offset, "maximum nesting depth exceeded"));
    }
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if n.as_u64().is_some() {
                return Err(SiphonError::decode(
                    offset,
                    format!("integer {n} is out of the signed 64-bit range"),
                ));
            } else {
                let f = n.as_f64().ok_or_else(|| {
                    SiphonError::decode(offset, format!("unrepresentable number {n}"))
                })?;
                if !f.is_finite() {
                    return Err(SiphonError::decode(
                        offset,
                        format!("number {n} overflows a 64-bit float"),
                    ));
                }
                Value::Float(f)
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                list.push(convert(item, depth + 1, offset, limits)?);
            }
            Value::List(list)
        }
        serde_json::Value::Object(map) => {
            if map.len() > limits.max_struct_fields {
                return Err(SiphonError::decode(offset, "too many fields in object"));
            }
            let mut fields = Vec::with_capacity(map.len());
            for (name, value) in map {
                fields.push((name, convert(value, depth + 1, offset, limits)?));
            }
            Value::Struct(fields)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str) -> Result<Vec<Value>> {
        JsonLinesReader::new(input.as_bytes(), Limits::default()).collect()
    }

    #[test]
    fn test_reads_one_record_per_line() {
        let values = read_all("{\"a\":1}\n{\"a\":2}\n").unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let values = read_all("\n{\"a\":1}\n\n  \n{\"a\":2}\n").unwrap();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_key_order_preserved() {
        let values = read_all("{\"dn\":\"x\",\"attributes\":{}}\n").unwrap();
        match &values[0] {
            Value::Struct(fields) => {
                let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["dn", "attributes"]);
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn test_number_classification() {
        let values = read_all("[1, -2, 1.5, 2e3]\n").unwrap();
        assert_eq!(
            values[0],
            Value::List(vec![
                Value::Int(1),
                Value::Int(-2),
                Value::Float(1.5),
                Value::Float(2000.0),
            ])
        );
    }

    #[test]
    fn test_malformed_line_reports_offset() {
        let result = read_all("{\"a\":1}\n{broken\n");
        match result {
            Err(SiphonError::Decode { offset, .. }) => assert_eq!(offset, 8),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_integer_rejected() {
        let result = read_all("{\"n\": 99999999999999999999}\n");
        assert!(matches!(result, Err(SiphonError::Decode { .. })));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(read_all("").unwrap(), vec![]);
    }
}
