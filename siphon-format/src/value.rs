//! The generic in-memory record representation

use crate::decimal::Decimal;
use crate::timestamp::Timestamp;

/// One decoded value in the generic interchange model.
///
/// Decoders construct these; encoders and the annotation policy consume
/// them. The model itself carries no behavior beyond structural equality
/// and traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value; typed nulls of the interchange notation all collapse here
    Null,
    /// Boolean value
    Bool(bool),
    /// Signed integer value
    Int(i64),
    /// Binary floating point value
    Float(f64),
    /// Exact base-10 decimal value
    Decimal(Decimal),
    /// Point in time with recorded precision
    Timestamp(Timestamp),
    /// UTF-8 text value
    String(String),
    /// Opaque byte sequence; no implicit text encoding
    Blob(Vec<u8>),
    /// Ordered sequence of values
    List(Vec<Value>),
    /// Field-keyed structure, insertion order preserved, field names unique
    Struct(Vec<(String, Value)>),
    /// A value carrying ordered out-of-band annotation tags
    Annotated {
        /// Annotation tags in original order
        annotations: Vec<String>,
        /// The wrapped value; never another `Annotated`
        value: Box<Value>,
    },
}

impl Value {
    /// Wrap a value with annotations, collapsing nested wrappers so that
    /// `Annotated` never directly contains `Annotated`.
    ///
    /// An empty annotation list returns the value unchanged.
    pub fn annotated(annotations: Vec<String>, value: Value) -> Value {
        if annotations.is_empty() {
            return value;
        }
        match value {
            Value::Annotated {
                annotations: inner,
                value,
            } => {
                let mut merged = annotations;
                merged.extend(inner);
                Value::Annotated {
                    annotations: merged,
                    value,
                }
            }
            other => Value::Annotated {
                annotations,
                value: Box::new(other),
            },
        }
    }

    /// Look up a struct field by name.
    ///
    /// Returns `None` for non-struct values and missing fields.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(name, _)| name == field).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Name of this variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Timestamp(_) => "timestamp",
            Value::String(_) => "string",
            Value::Blob(_) => "blob",
            Value::List(_) => "list",
            Value::Struct(_) => "struct",
            Value::Annotated { .. } => "annotated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotated_empty_list_is_identity() {
        let v = Value::annotated(vec![], Value::Int(1));
        assert_eq!(v, Value::Int(1));
    }

    #[test]
    fn test_annotated_collapses_nesting() {
        let inner = Value::annotated(vec!["b".into()], Value::Int(1));
        let outer = Value::annotated(vec!["a".into()], inner);
        assert_eq!(
            outer,
            Value::Annotated {
                annotations: vec!["a".into(), "b".into()],
                value: Box::new(Value::Int(1)),
            }
        );
    }

    #[test]
    fn test_struct_get_preserves_order_semantics() {
        let s = Value::Struct(vec![
            ("dn".into(), Value::String("x".into())),
            ("attributes".into(), Value::Null),
        ]);
        assert_eq!(s.get("dn"), Some(&Value::String("x".into())));
        assert_eq!(s.get("attributes"), Some(&Value::Null));
        assert_eq!(s.get("missing"), None);
        assert_eq!(Value::Null.get("dn"), None);
    }

    #[test]
    fn test_type_names() {
        let cases = vec![
            (Value::Null, "null"),
            (Value::Bool(true), "bool"),
            (Value::Int(0), "int"),
            (Value::Float(0.0), "float"),
            (Value::String(String::new()), "string"),
            (Value::Blob(vec![]), "blob"),
            (Value::List(vec![]), "list"),
            (Value::Struct(vec![]), "struct"),
        ];
        for (value, expected) in cases {
            assert_eq!(value.type_name(), expected);
        }
    }
}
