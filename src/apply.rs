//! Copies the snapshot's category trees over the local `shared` partitions.
//!
//! Files are created or overwritten byte-for-byte. Files only present locally
//! stay where they are. A symlink standing at a copied path is replaced, so
//! writes never leave `shared/`. There is no rollback, so an I/O failure
//! part-way leaves the files copied so far in place.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::SyncError;

/// Copy every regular file under `source` to the same relative path under
/// `dest`. Returns the number of files written.
pub fn copy_tree(source: &Path, dest: &Path) -> Result<usize, SyncError> {
    let mut written = 0;

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| SyncError::Scan {
            path: e.path().unwrap_or(source).to_path_buf(),
            source: e,
        })?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            if entry.depth() > 0 {
                unlink_if_symlink(&target)?;
            }
            fs::create_dir_all(&target).map_err(|e| SyncError::Apply {
                path: target.clone(),
                source: e,
            })?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| SyncError::Apply {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            unlink_if_symlink(&target)?;
            fs::copy(entry.path(), &target).map_err(|e| SyncError::Apply {
                path: target.clone(),
                source: e,
            })?;
            written += 1;
        } else {
            debug!(path = ?entry.path(), "apply_skip_non_regular");
        }
    }

    info!(source = ?source, dest = ?dest, files = written, "apply_tree_complete");
    Ok(written)
}

/// Remove a symlink at `target` so the copy lands inside `dest` instead of
/// at the link's target.
fn unlink_if_symlink(target: &Path) -> Result<(), SyncError> {
    let is_link = fs::symlink_metadata(target)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if !is_link {
        return Ok(());
    }

    debug!(path = ?target, "apply_replace_symlink");
    fs::remove_file(target)
        .or_else(|_| fs::remove_dir(target))
        .map_err(|e| SyncError::Apply {
            path: target.to_path_buf(),
            source: e,
        })
}
