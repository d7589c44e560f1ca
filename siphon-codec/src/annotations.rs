//! Annotation policy applied between decode and encode

use siphon_format::Value;

/// What to do with annotations attached to decoded values.
///
/// The default is [`Strip`](AnnotationPolicy::Strip), matching the
/// documented interchange-to-JSON down-conversion convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationPolicy {
    /// Discard annotations and encode only the inner values
    Strip,
    /// Leave annotation wrappers in place for the encoder to render
    Keep,
}

impl AnnotationPolicy {
    /// Derive the policy from the `keep_annotations` configuration flag.
    pub fn from_keep_flag(keep: bool) -> Self {
        if keep {
            AnnotationPolicy::Keep
        } else {
            AnnotationPolicy::Strip
        }
    }

    /// Apply the policy to one decoded record.
    pub fn apply(&self, value: Value) -> Value {
        match self {
            AnnotationPolicy::Keep => value,
            AnnotationPolicy::Strip => strip(value),
        }
    }
}

/// Remove every annotation wrapper, at any depth.
fn strip(value: Value) -> Value {
    match value {
        Value::Annotated { value, .. } => strip(*value),
        Value::List(items) => Value::List(items.into_iter().map(strip).collect()),
        Value::Struct(fields) => Value::Struct(
            fields
                .into_iter()
                .map(|(name, value)| (name, strip(value)))
                .collect(),
        ),
        scalar => scalar,
    }
}
