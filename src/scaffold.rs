//! Tree scaffolding for the local installation.
//!
//! Ensures every category/partition directory exists and seeds team-owned
//! partitions with a README marker. Existing files are never touched.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::SyncError;
use crate::layout::{Category, LocalInstallation, Partition};
use crate::templates;

/// Status of a scaffold entry at planning time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaffoldStatus {
    /// Missing; will be created.
    WillCreate,
    /// Already present; left alone.
    Exists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaffoldKind {
    Directory,
    Readme(&'static str),
}

#[derive(Debug, Clone)]
pub struct ScaffoldEntry {
    /// Path relative to the installation root, for display.
    pub display_path: String,
    pub full_path: PathBuf,
    pub kind: ScaffoldKind,
    pub status: ScaffoldStatus,
}

/// Everything the installation layout requires, checked against disk.
#[derive(Debug, Clone)]
pub struct ScaffoldPlan {
    pub entries: Vec<ScaffoldEntry>,
}

impl ScaffoldPlan {
    /// Build the plan by checking which directories and markers exist.
    pub fn new(install: &LocalInstallation) -> Self {
        let mut entries = Vec::new();

        for category in Category::ALL {
            for partition in Partition::ALL {
                let dir = install.partition_dir(category, partition);
                let display = format!("{}/{}", category.dir_name(), partition.dir_name());
                entries.push(entry(display.clone(), dir.clone(), ScaffoldKind::Directory));

                if let Some(content) = templates::readme_for(category, partition) {
                    entries.push(entry(
                        format!("{}/{}", display, templates::README_FILE_NAME),
                        dir.join(templates::README_FILE_NAME),
                        ScaffoldKind::Readme(content),
                    ));
                }
            }
        }

        Self { entries }
    }

    /// Entries that will be created.
    pub fn pending(&self) -> impl Iterator<Item = &ScaffoldEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == ScaffoldStatus::WillCreate)
    }

    /// Create every pending entry. Returns the display paths actually created.
    pub fn apply(&self) -> Result<Vec<String>, SyncError> {
        let mut created = Vec::new();

        for item in self.pending() {
            let scaffold_err = |source: io::Error| SyncError::Scaffold {
                path: item.full_path.clone(),
                source,
            };

            match item.kind {
                ScaffoldKind::Directory => {
                    fs::create_dir_all(&item.full_path).map_err(scaffold_err)?;
                }
                ScaffoldKind::Readme(content) => {
                    if !write_if_absent(&item.full_path, content).map_err(scaffold_err)? {
                        debug!(path = ?item.full_path, "scaffold_marker_appeared");
                        continue;
                    }
                }
            }

            info!(path = %item.display_path, "scaffold_created");
            created.push(item.display_path.clone());
        }

        Ok(created)
    }
}

/// Plan and apply in one step.
pub fn ensure_layout(install: &LocalInstallation) -> Result<Vec<String>, SyncError> {
    ScaffoldPlan::new(install).apply()
}

fn entry(display_path: String, full_path: PathBuf, kind: ScaffoldKind) -> ScaffoldEntry {
    let status = if full_path.exists() {
        ScaffoldStatus::Exists
    } else {
        ScaffoldStatus::WillCreate
    };
    ScaffoldEntry {
        display_path,
        full_path,
        kind,
        status,
    }
}

/// Write `content` only if nothing exists at `path`. Returns whether it wrote.
fn write_if_absent(path: &std::path::Path, content: &str) -> io::Result<bool> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(content.as_bytes())?;
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    fn snapshot(root: &std::path::Path) -> BTreeMap<String, Option<Vec<u8>>> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().display().to_string();
                let content = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
                (rel, content)
            })
            .collect()
    }

    #[test]
    fn test_fresh_install_creates_everything() {
        let dir = TempDir::new().unwrap();
        let install = LocalInstallation::new(dir.path().join(".cursor"));

        let plan = ScaffoldPlan::new(&install);
        // 6 directories + 4 README markers.
        assert_eq!(plan.entries.len(), 10);
        assert_eq!(plan.pending().count(), 10);

        let created = plan.apply().unwrap();
        assert_eq!(created.len(), 10);

        for category in Category::ALL {
            for partition in Partition::ALL {
                let partition_dir = install.partition_dir(category, partition);
                assert!(partition_dir.is_dir());
                assert_eq!(
                    partition_dir.join("README.md").exists(),
                    partition.has_readme_marker()
                );
            }
        }
        let readme = fs::read_to_string(
            install
                .partition_dir(Category::Rules, Partition::Project)
                .join("README.md"),
        )
        .unwrap();
        assert_eq!(readme, templates::RULES_PROJECT_README_MD);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let install = LocalInstallation::new(dir.path());

        ensure_layout(&install).unwrap();
        let after_first = snapshot(dir.path());

        let created = ensure_layout(&install).unwrap();
        assert!(created.is_empty());
        assert_eq!(snapshot(dir.path()), after_first);
    }

    #[test]
    fn test_existing_readme_is_preserved() {
        let dir = TempDir::new().unwrap();
        let install = LocalInstallation::new(dir.path());
        let project = install.partition_dir(Category::Prompts, Partition::Project);
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("README.md"), "our own notes").unwrap();

        let plan = ScaffoldPlan::new(&install);
        let marker = plan
            .entries
            .iter()
            .find(|e| e.display_path == "prompts/project/README.md")
            .unwrap();
        assert_eq!(marker.status, ScaffoldStatus::Exists);

        plan.apply().unwrap();
        assert_eq!(
            fs::read_to_string(project.join("README.md")).unwrap(),
            "our own notes"
        );
    }

    #[test]
    fn test_write_if_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("README.md");
        assert!(write_if_absent(&path, "first").unwrap());
        assert!(!write_if_absent(&path, "second").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }
}
