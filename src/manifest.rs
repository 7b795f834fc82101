//! File manifests: the sorted set of template files under a tree.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::SyncError;

/// Relative paths of template files under one tree root.
///
/// Paths use `/` separators and are ordered lexicographically, so two manifests
/// built with the same extension list compare meaningfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileManifest {
    files: BTreeSet<String>,
}

impl FileManifest {
    /// Walk `root` recursively and collect every regular file whose extension
    /// is in `extensions`. A missing root yields an empty manifest.
    pub fn scan(root: &Path, extensions: &[String]) -> Result<Self, SyncError> {
        if !root.exists() {
            debug!(root = ?root, "manifest_root_missing");
            return Ok(Self::default());
        }

        let mut files = BTreeSet::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| SyncError::Scan {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: e,
            })?;
            if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                files.insert(to_slash_path(relative));
            }
        }

        debug!(root = ?root, count = files.len(), "manifest_scanned");
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub(crate) fn set(&self) -> &BTreeSet<String> {
        &self.files
    }
}

impl<S: Into<String>> FromIterator<S> for FileManifest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

fn to_slash_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
