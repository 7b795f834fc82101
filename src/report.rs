//! Human-readable rendering of pending changes and run progress.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crossterm::style::Stylize;
use similar::TextDiff;

use crate::diff::CategoryChanges;
use crate::error::SyncError;

/// Header for the added partition.
pub const ADDED_LABEL: &str = "New files:";
/// Header for the updated-candidate partition.
pub const UPDATED_LABEL: &str = "Updated files (overwritten):";
/// Header for the removed-candidate partition. These files are not deleted.
pub const LOCAL_ONLY_LABEL: &str = "Only in local installation (kept, not deleted):";

/// Render the per-category change summary. Empty partitions are omitted;
/// the two manifest counts are always shown.
pub fn render_changes<W: Write>(out: &mut W, plan: &[CategoryChanges]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "Changes summary".bold())?;

    for entry in plan {
        writeln!(out)?;
        writeln!(out, "{}", format!("{}:", entry.category.label()).cyan().bold())?;

        section(out, ADDED_LABEL, "+", &entry.changes.added, Marker::Added)?;
        section(
            out,
            UPDATED_LABEL,
            "~",
            &entry.changes.updated_candidates,
            Marker::Updated,
        )?;
        section(
            out,
            LOCAL_ONLY_LABEL,
            "-",
            &entry.changes.removed_candidates,
            Marker::LocalOnly,
        )?;

        writeln!(out, "  Files in latest version: {}", entry.remote_count)?;
        writeln!(out, "  Files currently installed: {}", entry.local_count)?;
    }

    Ok(())
}

#[derive(Clone, Copy)]
enum Marker {
    Added,
    Updated,
    LocalOnly,
}

fn section<W: Write>(
    out: &mut W,
    label: &str,
    marker: &str,
    paths: &[String],
    kind: Marker,
) -> io::Result<()> {
    if paths.is_empty() {
        return Ok(());
    }

    writeln!(out, "  {}", label)?;
    for path in paths {
        let marker = match kind {
            Marker::Added => marker.green(),
            Marker::Updated => marker.yellow(),
            Marker::LocalOnly => marker.dark_grey(),
        };
        writeln!(out, "    {} {}", marker, path)?;
    }
    Ok(())
}

/// Print a unified diff for every updated candidate whose content differs.
/// Returns how many files differ.
pub fn render_content_diffs<W: Write>(
    out: &mut W,
    entry: &CategoryChanges,
    remote_dir: &Path,
    shared_dir: &Path,
) -> Result<usize, SyncError> {
    let mut differing = 0;

    for path in &entry.changes.updated_candidates {
        let remote = read_for_diff(&remote_dir.join(path))?;
        let local = read_for_diff(&shared_dir.join(path))?;
        if remote == local {
            continue;
        }
        differing += 1;

        let display = format!("{}/{}", entry.category.dir_name(), path);
        match (std::str::from_utf8(&local), std::str::from_utf8(&remote)) {
            (Ok(old), Ok(new)) => {
                let diff = TextDiff::from_lines(old, new);
                let unified = diff
                    .unified_diff()
                    .context_radius(3)
                    .header(&format!("installed/{}", display), &format!("latest/{}", display))
                    .to_string();
                write!(out, "{}", unified).map_err(SyncError::Output)?;
            }
            _ => writeln!(out, "Binary file {} differs", display).map_err(SyncError::Output)?,
        }
    }

    Ok(differing)
}

fn read_for_diff(path: &Path) -> Result<Vec<u8>, SyncError> {
    fs::read(path).map_err(|source| SyncError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// A progress line for a pipeline step.
pub fn step<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "==>".blue().bold(), message)
}

/// A line for each scaffolded path.
pub fn created<W: Write>(out: &mut W, display_path: &str) -> io::Result<()> {
    writeln!(out, "   {} {}", "Creating".green(), display_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChangeSet;
    use crate::layout::Category;
    use crate::manifest::FileManifest;
    use tempfile::TempDir;

    fn render_to_string(plan: &[CategoryChanges]) -> String {
        let mut buf = Vec::new();
        render_changes(&mut buf, plan).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn count_marked(output: &str, marker: &str) -> usize {
        output
            .lines()
            .filter(|l| l.starts_with("    ") && l.contains(marker) && l.contains(".md"))
            .count()
    }

    #[test]
    fn test_scenario_counts() {
        let shared: Vec<String> = (0..18).map(|i| format!("common-{i:02}.md")).collect();
        let remote: FileManifest = shared
            .iter()
            .cloned()
            .chain((0..7).map(|i| format!("new-{i}.md")))
            .collect();
        let local: FileManifest = shared
            .iter()
            .cloned()
            .chain((0..2).map(|i| format!("old-{i}.md")))
            .collect();
        let plan = vec![CategoryChanges::compute(Category::Prompts, &remote, &local)];

        let output = render_to_string(&plan);

        assert!(output.contains(ADDED_LABEL));
        assert!(output.contains(UPDATED_LABEL));
        assert!(output.contains(LOCAL_ONLY_LABEL));
        assert_eq!(output.lines().filter(|l| l.contains(" new-")).count(), 7);
        assert_eq!(output.lines().filter(|l| l.contains(" common-")).count(), 18);
        assert_eq!(output.lines().filter(|l| l.contains(" old-")).count(), 2);
        assert!(output.contains("Files in latest version: 25"));
        assert!(output.contains("Files currently installed: 20"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let remote: FileManifest = ["a.md", "b.md"].into_iter().collect();
        let plan = vec![CategoryChanges::compute(
            Category::Rules,
            &remote,
            &FileManifest::default(),
        )];

        let output = render_to_string(&plan);

        assert!(output.contains("Rules:"));
        assert!(output.contains(ADDED_LABEL));
        assert!(!output.contains(UPDATED_LABEL));
        assert!(!output.contains(LOCAL_ONLY_LABEL));
        assert_eq!(count_marked(&output, "+"), 2);
        assert!(output.contains("Files currently installed: 0"));
    }

    #[test]
    fn test_local_only_wording_does_not_promise_deletion() {
        assert!(!LOCAL_ONLY_LABEL.to_lowercase().contains("removed"));
        assert!(LOCAL_ONLY_LABEL.contains("not deleted"));
    }

    #[test]
    fn test_both_categories_in_order() {
        let plan = vec![
            CategoryChanges {
                category: Category::Prompts,
                changes: ChangeSet::default(),
                remote_count: 0,
                local_count: 0,
            },
            CategoryChanges {
                category: Category::Rules,
                changes: ChangeSet::default(),
                remote_count: 0,
                local_count: 0,
            },
        ];
        let output = render_to_string(&plan);
        let prompts = output.find("Prompts:").unwrap();
        let rules = output.find("Rules:").unwrap();
        assert!(prompts < rules);
    }

    #[test]
    fn test_content_diffs_skip_identical_files() {
        let dir = TempDir::new().unwrap();
        let remote = dir.path().join("remote");
        let shared = dir.path().join("shared");
        fs::create_dir_all(&remote).unwrap();
        fs::create_dir_all(&shared).unwrap();
        fs::write(remote.join("same.md"), "unchanged\n").unwrap();
        fs::write(shared.join("same.md"), "unchanged\n").unwrap();
        fs::write(remote.join("changed.md"), "line one\nline two\n").unwrap();
        fs::write(shared.join("changed.md"), "line one\nold two\n").unwrap();

        let remote_manifest: FileManifest = ["same.md", "changed.md"].into_iter().collect();
        let entry = CategoryChanges::compute(Category::Prompts, &remote_manifest, &remote_manifest);

        let mut buf = Vec::new();
        let differing = render_content_diffs(&mut buf, &entry, &remote, &shared).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert_eq!(differing, 1);
        assert!(output.contains("--- installed/prompts/changed.md"));
        assert!(output.contains("+++ latest/prompts/changed.md"));
        assert!(output.contains("-old two"));
        assert!(output.contains("+line two"));
        assert!(!output.contains("same.md"));
    }

    #[test]
    fn test_content_diff_read_failure_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let remote = dir.path().join("remote");
        let shared = dir.path().join("shared");
        fs::create_dir_all(&remote).unwrap();
        fs::create_dir_all(&shared).unwrap();
        fs::write(remote.join("gone.md"), "latest\n").unwrap();

        let manifest: FileManifest = ["gone.md"].into_iter().collect();
        let entry = CategoryChanges::compute(Category::Rules, &manifest, &manifest);

        let mut buf = Vec::new();
        let err = render_content_diffs(&mut buf, &entry, &remote, &shared).unwrap_err();

        assert_eq!(err.kind(), "read");
        assert!(err.to_string().contains("gone.md"));
        assert!(!err.to_string().contains("write report"));
    }
}
