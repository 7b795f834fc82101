//! Interrupt handling for a sync run.
//!
//! Handlers are registered when [`Interrupts::install`] returns, before the
//! pipeline creates its scratch directory. A signal that lands while the
//! pipeline is busy between await points is held until the next poll.

use std::future::Future;
use std::io::Write;

use tokio::io::AsyncBufRead;
use tracing::info;

use crate::error::SyncError;
use crate::sync::{self, Outcome, SyncOptions};

/// Registered listeners for the signals that stop a run.
pub struct Interrupts {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl Interrupts {
    /// Register SIGINT and SIGTERM (Ctrl-C elsewhere).
    pub fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for the next signal and return its name.
    pub async fn recv(&mut self) -> &'static str {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.interrupt.recv() => "SIGINT",
                _ = self.terminate.recv() => "SIGTERM",
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            "ctrl-c"
        }
    }
}

/// Drive [`sync::run`] until it finishes or `interrupted` resolves.
///
/// Returns `None` when interrupted. The pipeline future is dropped before
/// this returns, so its scratch directory is already gone.
pub async fn run_until<I, R, W>(
    interrupted: I,
    opts: &SyncOptions,
    input: &mut R,
    out: &mut W,
) -> Option<Result<Outcome, SyncError>>
where
    I: Future<Output = &'static str>,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let run = sync::run(opts, input, out);
    tokio::pin!(run);
    tokio::pin!(interrupted);

    tokio::select! {
        biased;
        signal = &mut interrupted => {
            info!(signal, "interrupt_received");
            None
        }
        result = &mut run => Some(result),
    }
}
