//! The confirmation gate in front of every mutation of `shared/`.
//!
//! A single blocking read with no timeout. Anything other than an explicit
//! `y`/`yes` (any case) declines, including an empty line and EOF.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Decline,
}

impl Decision {
    /// Interpret one line of operator input.
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Self::Proceed,
            _ => Self::Decline,
        }
    }
}

/// Print `question` with a `[y/N]` suffix and wait for one line of input.
pub async fn ask<R, W>(question: &str, input: &mut R, out: &mut W) -> Result<Decision, SyncError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{} [y/N] ", question).map_err(SyncError::Prompt)?;
    out.flush().map_err(SyncError::Prompt)?;

    let mut answer = String::new();
    let read = input
        .read_line(&mut answer)
        .await
        .map_err(SyncError::Prompt)?;

    let decision = if read == 0 {
        // Closed stdin; keep the report on its own line.
        writeln!(out).map_err(SyncError::Prompt)?;
        Decision::Decline
    } else {
        Decision::from_answer(&answer)
    };

    info!(decision = ?decision, eof = read == 0, "confirmation_answered");
    Ok(decision)
}
