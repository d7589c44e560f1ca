//! Durable storage handoff

use std::fs;
use std::path::{Path, PathBuf};

use siphon_format::{Result, SiphonError};

/// Hands a completed staging file to durable storage.
///
/// An external collaborator of the pipeline; the shipped
/// [`LocalFileStore`] persists to a local destination path.
pub trait StorageSink: Send + Sync {
    /// Persist the staged file and return its permanent reference.
    fn persist(&self, staged: &Path) -> Result<String>;
}

/// Store that moves the staged file to a fixed destination path
#[derive(Debug)]
pub struct LocalFileStore {
    destination: PathBuf,
}

impl LocalFileStore {
    /// Persist to the given destination path.
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }
}

impl StorageSink for LocalFileStore {
    fn persist(&self, staged: &Path) -> Result<String> {
        if let Some(parent) = self.destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    SiphonError::Persist(format!(
                        "cannot create '{}': {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        // Rename when staging and destination share a filesystem; fall back
        // to copy + remove across mount points.
        if fs::rename(staged, &self.destination).is_err() {
            fs::copy(staged, &self.destination).map_err(|e| {
                SiphonError::Persist(format!(
                    "cannot copy staged file to '{}': {e}",
                    self.destination.display()
                ))
            })?;
            let _ = fs::remove_file(staged);
        }
        Ok(self.destination.display().to_string())
    }
}
