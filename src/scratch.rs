//! Scratch directory for one sync run.
//!
//! Holds the downloaded archive and its extracted tree. The directory is
//! removed when the handle is dropped, whether the run finished, was
//! cancelled, failed, or its future was dropped on interrupt.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{info, warn};

/// Name of the downloaded archive inside the scratch directory.
const ARCHIVE_FILE_NAME: &str = "snapshot.zip";

/// Name of the extraction directory inside the scratch directory.
const EXTRACT_DIR_NAME: &str = "extracted";

/// An exclusively owned, ephemeral working directory.
pub struct ScratchDir {
    inner: Option<TempDir>,
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh scratch directory under `parent`, or the system temp
    /// directory when `parent` is `None`.
    pub fn create(parent: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("shared-prompts-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();

        info!(path = ?path, "scratch_created");
        Ok(Self {
            inner: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the fetcher writes the downloaded archive.
    pub fn archive_path(&self) -> PathBuf {
        self.path.join(ARCHIVE_FILE_NAME)
    }

    /// Where the extractor unpacks the archive.
    pub fn extract_dir(&self) -> PathBuf {
        self.path.join(EXTRACT_DIR_NAME)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.inner.take() {
            match dir.close() {
                Ok(()) => info!(path = ?self.path, "scratch_removed"),
                Err(e) => warn!(path = ?self.path, error = %e, "scratch_remove_failed"),
            }
        }
    }
}
