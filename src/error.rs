//! Error taxonomy for a sync run.
//!
//! Every variant is fatal to the run. The message names the phase that failed.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("Could not install interrupt handler: {0}")]
    Signal(#[source] std::io::Error),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Extract failed: {0}")]
    Extract(String),

    #[error("Unexpected snapshot layout: {0}")]
    Layout(String),

    #[error("Scaffolding failed for {}: {source}", path.display())]
    Scaffold {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not read {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("Could not read {} for comparison: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not read confirmation: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("Apply failed at {}: {source}", path.display())]
    Apply {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not write report: {0}")]
    Output(#[source] std::io::Error),
}

impl SyncError {
    /// Short phase label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Scratch(_) => "scratch",
            Self::Signal(_) => "signal",
            Self::Fetch(_) => "fetch",
            Self::Extract(_) => "extract",
            Self::Layout(_) => "layout",
            Self::Scaffold { .. } => "scaffold",
            Self::Scan { .. } => "scan",
            Self::Read { .. } => "read",
            Self::Prompt(_) => "prompt",
            Self::Apply { .. } => "apply",
            Self::Output(_) => "output",
        }
    }
}
