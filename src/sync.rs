//! The sync pipeline.
//!
//! ```text
//! FETCHING → EXTRACTING → VALIDATING_LAYOUT → SCAFFOLDING → DIFFING → REPORTING
//!   → AWAITING_CONFIRMATION → { APPLYING → DONE | CANCELLED }
//! ```
//!
//! Any phase can fail. Every terminal state drops the scratch directory.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::AsyncBufRead;
use tracing::{debug, info, warn};

use crate::apply;
use crate::archive::{self, RemoteSnapshot};
use crate::config::Config;
use crate::confirm::{self, Decision};
use crate::diff::CategoryChanges;
use crate::error::SyncError;
use crate::fetch::{self, Fetcher};
use crate::layout::{Category, LocalInstallation};
use crate::manifest::FileManifest;
use crate::report;
use crate::scaffold;
use crate::scratch::ScratchDir;
use crate::validators;

/// Pipeline phase, used for logging transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fetching,
    Extracting,
    ValidatingLayout,
    Scaffolding,
    Diffing,
    Reporting,
    AwaitingConfirmation,
    Applying,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Fetching => "FETCHING",
            Phase::Extracting => "EXTRACTING",
            Phase::ValidatingLayout => "VALIDATING_LAYOUT",
            Phase::Scaffolding => "SCAFFOLDING",
            Phase::Diffing => "DIFFING",
            Phase::Reporting => "REPORTING",
            Phase::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            Phase::Applying => "APPLYING",
        }
    }
}

/// Non-error terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Files written per category.
    Applied(Vec<(Category, usize)>),
    /// The operator declined. Nothing under `shared/` changed.
    Cancelled,
    /// Stopped after the report.
    DryRun,
}

/// Everything one run needs, resolved from config and CLI flags.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub repo: String,
    pub branch: String,
    /// Use this archive instead of downloading one.
    pub archive: Option<PathBuf>,
    pub root: PathBuf,
    pub extensions: Vec<String>,
    pub timeout: Duration,
    /// Where the scratch directory is created; system temp dir when `None`.
    pub scratch_parent: Option<PathBuf>,
    /// Skip the confirmation gate.
    pub assume_yes: bool,
    pub dry_run: bool,
    /// Print content diffs for updated candidates.
    pub show_diff: bool,
}

impl SyncOptions {
    /// Validate `config` and build options with interactive defaults.
    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        let errors = validators::validate_config(config);
        if !errors.is_empty() {
            return Err(SyncError::Config(errors.join("; ")));
        }

        Ok(Self {
            repo: config.remote.repo.trim().to_string(),
            branch: config.remote.branch.clone(),
            archive: None,
            root: config.root_path(),
            extensions: config.sync.extensions.clone(),
            timeout: Duration::from_secs(config.remote.timeout_secs),
            scratch_parent: None,
            assume_yes: false,
            dry_run: false,
            show_diff: false,
        })
    }
}

fn enter(phase: Phase) {
    info!(phase = phase.label(), "phase_enter");
}

/// Run one sync. Progress and the report go to `out`; the confirmation
/// answer is read from `input`.
pub async fn run<R, W>(opts: &SyncOptions, input: &mut R, out: &mut W) -> Result<Outcome, SyncError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let scratch = ScratchDir::create(opts.scratch_parent.as_deref()).map_err(SyncError::Scratch)?;
    let install = LocalInstallation::new(&opts.root);
    debug!(scratch = ?scratch.path(), root = ?install.root(), "run_start");

    let snapshot = obtain_snapshot(opts, &scratch, out).await?;

    enter(Phase::Scaffolding);
    for path in scaffold::ensure_layout(&install)? {
        report::created(out, &path).map_err(SyncError::Output)?;
    }

    enter(Phase::Diffing);
    let mut plan = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let remote = FileManifest::scan(&snapshot.category_dir(category), &opts.extensions)?;
        if remote.is_empty() {
            warn!(category = category.dir_name(), "snapshot_category_empty");
        }
        let local = FileManifest::scan(&install.shared_dir(category), &opts.extensions)?;
        let changes = CategoryChanges::compute(category, &remote, &local);
        info!(
            category = category.dir_name(),
            added = changes.changes.added.len(),
            updated = changes.changes.updated_candidates.len(),
            local_only = changes.changes.removed_candidates.len(),
            "diff_computed"
        );
        plan.push(changes);
    }

    enter(Phase::Reporting);
    report::render_changes(out, &plan).map_err(SyncError::Output)?;
    if plan.iter().all(|entry| entry.changes.is_empty()) {
        writeln!(out, "\nNo templates in the latest version and none installed.")
            .map_err(SyncError::Output)?;
    }
    if opts.show_diff {
        writeln!(out).map_err(SyncError::Output)?;
        for entry in &plan {
            report::render_content_diffs(
                out,
                entry,
                &snapshot.category_dir(entry.category),
                &install.shared_dir(entry.category),
            )?;
        }
    }
    writeln!(out).map_err(SyncError::Output)?;

    if opts.dry_run {
        writeln!(out, "Dry run: no files were changed.").map_err(SyncError::Output)?;
        return Ok(Outcome::DryRun);
    }

    enter(Phase::AwaitingConfirmation);
    let decision = if opts.assume_yes {
        info!("confirmation_bypassed");
        Decision::Proceed
    } else {
        confirm::ask("Apply these changes to the shared directories?", input, out).await?
    };

    if decision == Decision::Decline {
        writeln!(out, "Cancelled. No files were changed.").map_err(SyncError::Output)?;
        info!("sync_cancelled");
        return Ok(Outcome::Cancelled);
    }

    enter(Phase::Applying);
    let mut written = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let count = apply::copy_tree(&snapshot.category_dir(category), &install.shared_dir(category))?;
        writeln!(
            out,
            "   {}: {} file(s) written to {}",
            category.label(),
            count,
            install.shared_dir(category).display()
        )
        .map_err(SyncError::Output)?;
        written.push((category, count));
    }

    writeln!(out, "Shared prompts and rules are up to date.").map_err(SyncError::Output)?;
    info!(written = ?written, "sync_done");
    Ok(Outcome::Applied(written))
}

/// FETCHING → EXTRACTING → VALIDATING_LAYOUT.
async fn obtain_snapshot<W: Write>(
    opts: &SyncOptions,
    scratch: &ScratchDir,
    out: &mut W,
) -> Result<RemoteSnapshot, SyncError> {
    let archive_path = match &opts.archive {
        Some(path) => {
            info!(path = ?path, "fetch_skipped_local_archive");
            report::step(out, &format!("Using archive {}", path.display()))
                .map_err(SyncError::Output)?;
            path.clone()
        }
        None => {
            enter(Phase::Fetching);
            let url = fetch::archive_url(&opts.repo, &opts.branch);
            report::step(out, &format!("Fetching {}", url)).map_err(SyncError::Output)?;
            let fetcher = Fetcher::new(opts.timeout)?;
            fetcher.download(&url, &scratch.archive_path()).await?;
            scratch.archive_path()
        }
    };

    enter(Phase::Extracting);
    report::step(out, "Extracting snapshot").map_err(SyncError::Output)?;
    let expected = archive::expected_root_name(&opts.repo, &opts.branch);
    let root = archive::extract(&archive_path, &scratch.extract_dir(), &expected)?;

    enter(Phase::ValidatingLayout);
    let snapshot = archive::validate_layout(&root).inspect_err(|e| {
        warn!(error = %e, "layout_invalid");
    })?;
    debug!(root = ?snapshot.root(), "layout_valid");
    Ok(snapshot)
}
