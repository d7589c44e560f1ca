//! Siphon Test Utilities
//!
//! Shared helpers for building model values and source fixtures in tests.

use siphon_format::Value;

/// Builder for struct records with common field patterns
pub struct StructBuilder {
    fields: Vec<(String, Value)>,
}

impl StructBuilder {
    /// Create a new record builder
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field with a string value
    pub fn string(mut self, key: &str, value: &str) -> Self {
        self.fields
            .push((key.to_string(), Value::String(value.to_string())));
        self
    }

    /// Add a field with an integer value
    pub fn int(mut self, key: &str, value: i64) -> Self {
        self.fields.push((key.to_string(), Value::Int(value)));
        self
    }

    /// Add a field with a boolean value
    pub fn bool(mut self, key: &str, value: bool) -> Self {
        self.fields.push((key.to_string(), Value::Bool(value)));
        self
    }

    /// Add a field with a null value
    pub fn null(mut self, key: &str) -> Self {
        self.fields.push((key.to_string(), Value::Null));
        self
    }

    /// Add a field with a blob value
    pub fn blob(mut self, key: &str, bytes: &[u8]) -> Self {
        self.fields
            .push((key.to_string(), Value::Blob(bytes.to_vec())));
        self
    }

    /// Add a field with a list of values
    pub fn list(mut self, key: &str, items: Vec<Value>) -> Self {
        self.fields.push((key.to_string(), Value::List(items)));
        self
    }

    /// Add a field with an arbitrary value
    pub fn value(mut self, key: &str, value: Value) -> Self {
        self.fields.push((key.to_string(), value));
        self
    }

    /// Finish the record
    pub fn build(self) -> Value {
        Value::Struct(self.fields)
    }
}

impl Default for StructBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A directory-entry record in the interchange notation, with an annotated
/// base64 attribute. This is the shape the default-stripping conversion is
/// documented against.
pub fn ldap_entry_fixture() -> &'static str {
    r#"{dn:"cn=tony@orga.com,ou=diffusion_list,dc=orga,dc=com",attributes:{description:["Some description 2",base64::"TGlzdGUgZCfDg8KpY2hhbmdlIHN1ciBsZSBzdWl2aSBkZSBsYSBtYXNzZSBzYWxhcmlhbGUgZGUgbCdJVVQ=","Melusine lover as well"],someOtherAttribute:["perhaps 2","perhapsAgain 2"]}}"#
}

/// The JSON line the fixture converts to when annotations are stripped.
pub fn ldap_entry_expected_json() -> &'static str {
    r#"{"dn":"cn=tony@orga.com,ou=diffusion_list,dc=orga,dc=com","attributes":{"description":["Some description 2","TGlzdGUgZCfDg8KpY2hhbmdlIHN1ciBsZSBzdWl2aSBkZSBsYSBtYXNzZSBzYWxhcmlhbGUgZGUgbCdJVVQ=","Melusine lover as well"],"someOtherAttribute":["perhaps 2","perhapsAgain 2"]}}"#
}
