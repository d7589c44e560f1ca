//! Decode safety limits

/// Safety limits applied while decoding untrusted sources
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum container nesting depth (default: 128)
    pub max_depth: usize,
    /// Maximum string length per value in bytes (default: 16 MiB)
    pub max_string_len: usize,
    /// Maximum blob payload per value in bytes (default: 64 MiB)
    pub max_blob_len: usize,
    /// Maximum annotations attached to one value (default: 16)
    pub max_annotations_per_value: usize,
    /// Maximum fields per structure (default: 4,096)
    pub max_struct_fields: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_string_len: 16 * 1024 * 1024,
            max_blob_len: 64 * 1024 * 1024,
            max_annotations_per_value: 16,
            max_struct_fields: 4_096,
        }
    }
}
