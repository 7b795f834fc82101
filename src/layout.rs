//! Fixed directory layout of a local installation.
//!
//! ```text
//! <root>/prompts/{shared,project,experimental}/...
//! <root>/rules/{shared,project,experimental}/...
//! ```

use std::path::{Path, PathBuf};

/// A tracked template category. Each one is a separate tree on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Prompts,
    Rules,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Prompts, Category::Rules];

    /// Directory name, identical in the snapshot and the local installation.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Prompts => "prompts",
            Self::Rules => "rules",
        }
    }

    /// Display label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Prompts => "Prompts",
            Self::Rules => "Rules",
        }
    }
}

/// A partition inside a category of the local installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// Overwritten by every sync.
    Shared,
    /// Owned by the consuming team.
    Project,
    /// Owned by the consuming team.
    Experimental,
}

impl Partition {
    pub const ALL: [Partition; 3] = [
        Partition::Shared,
        Partition::Project,
        Partition::Experimental,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Project => "project",
            Self::Experimental => "experimental",
        }
    }

    /// Whether the scaffolder seeds this partition with a README marker.
    pub fn has_readme_marker(&self) -> bool {
        !matches!(self, Self::Shared)
    }
}

/// The persistent installation in the consuming project.
#[derive(Debug, Clone)]
pub struct LocalInstallation {
    root: PathBuf,
}

impl LocalInstallation {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn partition_dir(&self, category: Category, partition: Partition) -> PathBuf {
        self.root
            .join(category.dir_name())
            .join(partition.dir_name())
    }

    pub fn shared_dir(&self, category: Category) -> PathBuf {
        self.partition_dir(category, Partition::Shared)
    }
}
