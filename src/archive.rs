//! Snapshot extraction and layout validation.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::layout::Category;

/// An extracted snapshot with both category subtrees verified present.
#[derive(Debug, Clone)]
pub struct RemoteSnapshot {
    root: PathBuf,
}

impl RemoteSnapshot {
    /// Extracted top-level directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remote subtree that maps onto the local `shared` partition.
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }
}

/// Name of the directory a repository archive unpacks into:
/// `<repo-name>-<branch>` with `/` in the branch replaced by `-`.
pub fn expected_root_name(repo: &str, branch: &str) -> String {
    let repo_name = repo
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(repo)
        .trim_end_matches(".git");
    format!("{}-{}", repo_name, branch.replace('/', "-"))
}

/// Unpack `archive` into `dest` and locate its single top-level directory.
///
/// `expected_root` is the directory name the archive should contain. A
/// different name is accepted when it is the only top-level entry.
pub fn extract(archive: &Path, dest: &Path, expected_root: &str) -> Result<PathBuf, SyncError> {
    let file = File::open(archive)
        .map_err(|e| SyncError::Extract(format!("could not open {}: {}", archive.display(), e)))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| SyncError::Extract(format!("not a valid zip archive: {}", e)))?;
    debug!(entries = zip.len(), "archive_opened");

    fs::create_dir_all(dest)
        .map_err(|e| SyncError::Extract(format!("could not create {}: {}", dest.display(), e)))?;
    zip.extract(dest)
        .map_err(|e| SyncError::Extract(format!("could not unpack archive: {}", e)))?;

    let root = single_top_level_dir(dest)?;
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name != expected_root {
        warn!(expected = %expected_root, found = %name, "archive_root_name_mismatch");
    }

    info!(root = ?root, "archive_extracted");
    Ok(root)
}

/// Check that both category subtrees exist under the extracted root.
pub fn validate_layout(root: &Path) -> Result<RemoteSnapshot, SyncError> {
    let missing: Vec<&str> = Category::ALL
        .iter()
        .map(|c| c.dir_name())
        .filter(|name| !root.join(name).is_dir())
        .collect();

    if !missing.is_empty() {
        return Err(SyncError::Layout(format!(
            "missing {} in {}",
            missing
                .iter()
                .map(|m| format!("{}/", m))
                .collect::<Vec<_>>()
                .join(" and "),
            root.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| root.display().to_string())
        )));
    }

    Ok(RemoteSnapshot {
        root: root.to_path_buf(),
    })
}

fn single_top_level_dir(dest: &Path) -> Result<PathBuf, SyncError> {
    let entries: Vec<PathBuf> = fs::read_dir(dest)
        .map_err(|e| SyncError::Extract(format!("could not read {}: {}", dest.display(), e)))?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .collect();

    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        [] => Err(SyncError::Extract("archive is empty".to_string())),
        _ => Err(SyncError::Extract(format!(
            "expected a single top-level directory, found {} entries",
            entries.len()
        ))),
    }
}
