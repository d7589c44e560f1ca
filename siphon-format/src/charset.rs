//! Output character sets

use std::borrow::Cow;

use crate::error::{Result, SiphonError};

/// Supported output character sets.
///
/// Encoders always produce UTF-8 internally; the pipeline transcodes each
/// chunk to the configured charset before it reaches the staging sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8 (the default); chunks pass through unchanged
    Utf8,
    /// US-ASCII; any byte outside the 7-bit range is an error
    Ascii,
    /// ISO-8859-1 (Latin-1); characters above U+00FF are an error
    Latin1,
}

impl Charset {
    /// Resolve a configuration name.
    ///
    /// Accepts the canonical names and their common aliases,
    /// case-insensitively. Unknown names are a configuration error.
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_uppercase().replace('_', "-");
        match normalized.as_str() {
            "UTF-8" | "UTF8" => Ok(Charset::Utf8),
            "US-ASCII" | "ASCII" => Ok(Charset::Ascii),
            "ISO-8859-1" | "LATIN-1" | "LATIN1" => Ok(Charset::Latin1),
            _ => Err(SiphonError::Config(format!("unknown charset '{name}'"))),
        }
    }

    /// Canonical name of this charset.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Ascii => "US-ASCII",
            Charset::Latin1 => "ISO-8859-1",
        }
    }

    /// Transcode a UTF-8 chunk to this charset.
    ///
    /// Unmappable characters fail with an encode error (never substituted);
    /// callers attach the record index with [`SiphonError::at_record`].
    pub fn encode<'a>(&self, utf8: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        match self {
            Charset::Utf8 => Ok(Cow::Borrowed(utf8)),
            Charset::Ascii => {
                if let Some(byte) = utf8.iter().find(|b| !b.is_ascii()) {
                    return Err(SiphonError::encode(
                        0,
                        format!("byte 0x{byte:02x} has no US-ASCII representation"),
                    ));
                }
                Ok(Cow::Borrowed(utf8))
            }
            Charset::Latin1 => {
                let text = std::str::from_utf8(utf8).map_err(|e| {
                    SiphonError::encode(0, format!("output chunk is not valid UTF-8: {e}"))
                })?;
                if text.is_ascii() {
                    return Ok(Cow::Borrowed(utf8));
                }
                let mut out = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    let code = ch as u32;
                    if code > 0xFF {
                        return Err(SiphonError::encode(
                            0,
                            format!("character '{ch}' has no ISO-8859-1 representation"),
                        ));
                    }
                    out.push(code as u8);
                }
                Ok(Cow::Owned(out))
            }
        }
    }
}
