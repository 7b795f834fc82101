mod apply;
mod archive;
mod config;
mod confirm;
mod diff;
mod error;
mod fetch;
mod layout;
mod logging;
mod manifest;
mod report;
mod scaffold;
mod scratch;
mod signals;
mod sync;
mod templates;
mod validators;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use crossterm::style::Stylize;
use tracing::{debug, error, info, warn};

use crate::config::{Config, ConfigLoadStatus, LoadedConfig};
use crate::error::SyncError;
use crate::sync::{Outcome, SyncOptions};

/// Exit status after Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "update-shared-prompts", version)]
#[command(about = "Update the shared prompt and rule templates from the upstream repository")]
struct Args {
    /// Upstream repository URL
    #[arg(long)]
    repo: Option<String>,

    /// Branch to take the snapshot from
    #[arg(long)]
    branch: Option<String>,

    /// Installation root containing prompts/ and rules/
    #[arg(long)]
    root: Option<String>,

    /// Use a local zip archive instead of downloading
    #[arg(long, value_name = "FILE")]
    archive: Option<PathBuf>,

    /// Apply without asking for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Show the change report and stop
    #[arg(long)]
    dry_run: bool,

    /// Show content diffs for files that will be overwritten
    #[arg(long)]
    diff: bool,

    /// Download timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

impl Args {
    /// Command-line values win over every config layer.
    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(repo) = &self.repo {
            config.remote.repo = repo.clone();
        }
        if let Some(branch) = &self.branch {
            config.remote.branch = branch.clone();
        }
        if let Some(root) = &self.root {
            config.paths.root = root.clone();
        }
        if let Some(timeout) = self.timeout {
            config.remote.timeout_secs = timeout;
        }
        config
    }

    fn options(&self, config: &Config) -> Result<SyncOptions, SyncError> {
        let mut opts = SyncOptions::from_config(config)?;
        opts.archive = self.archive.clone();
        opts.assume_yes = self.yes;
        opts.dry_run = self.dry_run;
        opts.show_diff = self.diff;
        Ok(opts)
    }
}

fn log_config_status(loaded: &LoadedConfig) {
    debug!(
        config_path = %loaded.config_path.display(),
        project_config_path = ?loaded.project_config_path,
        status = ?loaded.status,
        "config_loaded"
    );
    match &loaded.status {
        ConfigLoadStatus::Created => {
            info!(path = %loaded.config_path.display(), "config_created");
        }
        ConfigLoadStatus::Error(e) => {
            eprintln!("{} {}", "warning:".yellow().bold(), e);
        }
        ConfigLoadStatus::Loaded => {}
    }
    if let Some(e) = &loaded.project_error {
        eprintln!("{} {}", "warning:".yellow().bold(), e);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let start_time = Instant::now();
    let args = Args::parse();

    crossterm::style::force_color_output(io::stdout().is_terminal());

    // Logging first so config load problems are recorded.
    let logging = match logging::init(logging::DEFAULT_LEVEL) {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("{} failed to initialize logging: {}", "warning:".yellow().bold(), e);
            None
        }
    };

    let loaded = config::load_config();
    let config = args.apply_overrides(loaded.config.clone());
    if let Some(ctx) = &logging {
        if let Err(e) = ctx.set_level(&config.logging.level) {
            eprintln!("{} {}", "warning:".yellow().bold(), e);
        }
        logging::cleanup_old_logs(&ctx.log_directory);
    }
    log_config_status(&loaded);

    let opts = match args.options(&config) {
        Ok(opts) => opts,
        Err(e) => return fail(&e),
    };

    // Registered before the pipeline can create its scratch directory.
    let mut interrupts = match signals::Interrupts::install() {
        Ok(interrupts) => interrupts,
        Err(e) => return fail(&SyncError::Signal(e)),
    };

    info!(
        repo = %opts.repo,
        branch = %opts.branch,
        root = %opts.root.display(),
        archive = ?opts.archive,
        "sync_start"
    );

    let mut input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut out = io::stdout();
    let result = signals::run_until(interrupts.recv(), &opts, &mut input, &mut out).await;

    let code = match result {
        Some(Ok(outcome)) => {
            match outcome {
                Outcome::Applied(_) => {}
                Outcome::Cancelled => info!("outcome_cancelled"),
                Outcome::DryRun => info!("outcome_dry_run"),
            }
            ExitCode::SUCCESS
        }
        Some(Err(e)) => fail(&e),
        None => {
            let _ = writeln!(io::stdout());
            eprintln!("{}", "Interrupted. No further changes were made.".yellow());
            warn!("interrupted");
            log_session_end(logging.as_ref(), start_time);
            drop(logging);
            // Stdin is read on a blocking thread that would hold up runtime shutdown.
            std::process::exit(EXIT_INTERRUPTED);
        }
    };

    log_session_end(logging.as_ref(), start_time);
    code
}

fn fail(e: &SyncError) -> ExitCode {
    error!(kind = e.kind(), error = %e, "sync_failed");
    eprintln!("{} {}", "error:".red().bold(), e);
    ExitCode::FAILURE
}

fn log_session_end(logging: Option<&logging::LoggingContext>, start_time: Instant) {
    if let Some(ctx) = logging {
        info!(
            session_id = %ctx.session_id,
            duration_secs = start_time.elapsed().as_secs_f64(),
            "session_end"
        );
    }
}
