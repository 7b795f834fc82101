//! Change detection between the snapshot and the installed `shared` partition.
//!
//! Classification is by path only. Content is never compared here, so a file
//! present on both sides is an update candidate whether or not it changed.

use crate::layout::Category;
use crate::manifest::FileManifest;

/// Three-way classification of two manifests. The three lists are disjoint
/// and each is sorted by relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// In the snapshot only.
    pub added: Vec<String>,
    /// On both sides; will be overwritten.
    pub updated_candidates: Vec<String>,
    /// Installed only. Never deleted by the applier.
    pub removed_candidates: Vec<String>,
}

impl ChangeSet {
    /// Ordered set differences: `added = remote - local`,
    /// `removed_candidates = local - remote`, `updated_candidates = remote ∩ local`.
    pub fn between(remote: &FileManifest, local: &FileManifest) -> Self {
        let (remote, local) = (remote.set(), local.set());
        Self {
            added: remote.difference(local).cloned().collect(),
            updated_candidates: remote.intersection(local).cloned().collect(),
            removed_candidates: local.difference(remote).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.updated_candidates.is_empty()
            && self.removed_candidates.is_empty()
    }
}

/// Pending changes for one category, with the manifest sizes the report shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChanges {
    pub category: Category,
    pub changes: ChangeSet,
    /// Files in the snapshot.
    pub remote_count: usize,
    /// Files currently installed.
    pub local_count: usize,
}

impl CategoryChanges {
    pub fn compute(category: Category, remote: &FileManifest, local: &FileManifest) -> Self {
        Self {
            category,
            changes: ChangeSet::between(remote, local),
            remote_count: remote.len(),
            local_count: local.len(),
        }
    }
}
