//! Staged output on local storage

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::{NamedTempFile, TempPath};

use siphon_format::{Result, SiphonError};

/// A uniquely named local file receiving encoded output before the
/// persist step.
///
/// Dropping the handle before [`StagingFile::into_temp_path`] removes the
/// file, so a failed or cancelled run never leaves a partial file where a
/// downstream persist step could pick it up. [`StagingFile::close`] is
/// idempotent; a second call during failure cleanup is a no-op.
pub struct StagingFile {
    state: State,
    bytes_written: u64,
}

enum State {
    Open(BufWriter<NamedTempFile>),
    Closed(NamedTempFile),
    Detached,
}

impl StagingFile {
    /// Allocate a staging file, in `dir` or the system temp directory.
    pub fn create(dir: Option<&Path>) -> Result<Self> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("siphon_").suffix(".staged");
            b
        };
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(Self {
            state: State::Open(BufWriter::new(file)),
            bytes_written: 0,
        })
    }

    /// Append an encoded chunk.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        match &mut self.state {
            State::Open(writer) => {
                writer.write_all(bytes)?;
                self.bytes_written += bytes.len() as u64;
                Ok(())
            }
            State::Closed(_) | State::Detached => Err(SiphonError::Persist(
                "staging file is already closed".into(),
            )),
        }
    }

    /// Flush buffered output and release the writer.
    ///
    /// Safe to call more than once. A flush failure leaves the handle
    /// detached and the partial file removed.
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Detached) {
            State::Open(mut writer) => {
                writer.flush()?;
                let file = writer
                    .into_inner()
                    .map_err(|e| SiphonError::from(e.into_error()))?;
                self.state = State::Closed(file);
                Ok(())
            }
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    /// Path of the staging file on local storage.
    pub fn path(&self) -> Option<&Path> {
        match &self.state {
            State::Open(writer) => Some(writer.get_ref().path()),
            State::Closed(file) => Some(file.path()),
            State::Detached => None,
        }
    }

    /// Total bytes appended so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Close and detach the flushed file for the persist step.
    ///
    /// The returned [`TempPath`] still removes the file on drop, so an
    /// aborted persist cleans up after itself.
    pub fn into_temp_path(mut self) -> Result<TempPath> {
        self.close()?;
        match std::mem::replace(&mut self.state, State::Detached) {
            State::Closed(file) => Ok(file.into_temp_path()),
            State::Open(_) | State::Detached => Err(SiphonError::Persist(
                "staging file was never opened".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_detach() {
        let mut staging = StagingFile::create(None).unwrap();
        staging.append(b"one\n").unwrap();
        staging.append(b"two\n").unwrap();
        assert_eq!(staging.bytes_written(), 8);

        let path = staging.into_temp_path().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"one\ntwo\n");
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut staging = StagingFile::create(None).unwrap();
        staging.append(b"payload").unwrap();
        staging.close().unwrap();
        staging.close().unwrap();
        let path = staging.into_temp_path().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
    }

    #[test]
    fn test_append_after_close_fails() {
        let mut staging = StagingFile::create(None).unwrap();
        staging.close().unwrap();
        assert!(matches!(
            staging.append(b"late"),
            Err(SiphonError::Persist(_))
        ));
    }

    #[test]
    fn test_drop_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut staging = StagingFile::create(Some(dir.path())).unwrap();
            staging.append(b"partial").unwrap();
            staging.path().unwrap().to_path_buf()
        };
        assert!(!path.exists(), "partial staging file must be removed");
    }

    #[test]
    fn test_staging_in_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingFile::create(Some(dir.path())).unwrap();
        assert!(staging.path().unwrap().starts_with(dir.path()));
    }
}
