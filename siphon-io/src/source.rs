//! Source resolution

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use siphon_format::{Result, SiphonError};

/// Magic bytes of a zstd frame.
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Resolves a logical source reference to an opened byte stream.
///
/// The resolver is an external collaborator of the pipeline; the shipped
/// [`FileResolver`] covers local files, and tests plug in their own.
pub trait SourceResolver: Send + Sync {
    /// Open the referenced source for reading.
    fn open(&self, reference: &str) -> Result<Box<dyn Read + Send>>;
}

/// Resolver for local filesystem paths
///
/// Compressed sources are detected by magic bytes and decompressed
/// transparently.
#[derive(Debug, Default)]
pub struct FileResolver;

impl SourceResolver for FileResolver {
    fn open(&self, reference: &str) -> Result<Box<dyn Read + Send>> {
        let file = File::open(Path::new(reference)).map_err(|e| {
            SiphonError::SourceUnavailable {
                reference: reference.to_string(),
                cause: e.to_string(),
            }
        })?;
        wrap_decompression(file, reference)
    }
}

/// Wrap a raw stream with transparent zstd decompression when its first
/// bytes carry the zstd magic.
fn wrap_decompression(file: File, reference: &str) -> Result<Box<dyn Read + Send>> {
    let mut reader = BufReader::new(file);
    let magic = reader.fill_buf().map_err(|e| SiphonError::SourceUnavailable {
        reference: reference.to_string(),
        cause: e.to_string(),
    })?;
    if magic.starts_with(&ZSTD_MAGIC) {
        let decoder = zstd::stream::read::Decoder::with_buffer(reader).map_err(|e| {
            SiphonError::SourceUnavailable {
                reference: reference.to_string(),
                cause: format!("zstd decoder setup failed: {e}"),
            }
        })?;
        Ok(Box::new(decoder))
    } else {
        Ok(Box::new(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let result = FileResolver.open("/definitely/not/here.ion");
        match result {
            Err(SiphonError::SourceUnavailable { reference, .. }) => {
                assert_eq!(reference, "/definitely/not/here.ion");
            }
            other => panic!(
                "expected source-unavailable, got {:?}",
                other.map(|_| "<stream>")
            ),
        }
    }

    #[test]
    fn test_plain_file_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.ion");
        std::fs::write(&path, "{a: 1}").unwrap();

        let mut stream = FileResolver.open(path.to_str().unwrap()).unwrap();
        let mut contents = String::new();
        stream.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "{a: 1}");
    }

    #[test]
    fn test_zstd_source_is_decompressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.ion.zst");
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = zstd::stream::write::Encoder::new(file, 3).unwrap();
        encoder.write_all(b"{a: 1}\n{a: 2}\n").unwrap();
        encoder.finish().unwrap();

        let mut stream = FileResolver.open(path.to_str().unwrap()).unwrap();
        let mut contents = String::new();
        stream.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "{a: 1}\n{a: 2}\n");
    }

    #[test]
    fn test_empty_file_opens_as_empty_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.ion");
        std::fs::write(&path, "").unwrap();

        let mut stream = FileResolver.open(path.to_str().unwrap()).unwrap();
        let mut contents = Vec::new();
        stream.read_to_end(&mut contents).unwrap();
        assert!(contents.is_empty());
    }
}
