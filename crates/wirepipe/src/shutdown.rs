//! Coordinated teardown of every relay handle.
//!
//! The coordinator waits for the first shutdown trigger -- SIGINT, SIGTERM,
//! or end-of-stream on either forwarding path -- then walks a fixed state
//! machine: `Running` -> `Stopping` (no new I/O is initiated) -> `Closing`
//! (every handle is closed and its closure confirmed) -> `Terminated`.
//! Triggers delivered after shutdown has begun are no-ops.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::relay::{PathEvent, RelayPaths};

/// Shutdown progress. States are entered at most once, strictly in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Normal operation, both forwarding paths active.
    Running,
    /// A trigger fired; no new I/O is initiated.
    Stopping,
    /// Handles are being closed; each closure is independently confirmed.
    Closing,
    /// Every handle has confirmed closure. Nothing fires after this.
    Terminated,
}

impl ShutdownState {
    /// The successor state. `Terminated` is terminal.
    pub const fn next(self) -> Self {
        match self {
            Self::Running => Self::Stopping,
            Self::Stopping => Self::Closing,
            Self::Closing | Self::Terminated => Self::Terminated,
        }
    }
}

/// How long writers get to drain already-queued chunks before their queued
/// work is dropped.
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Owns the shutdown trigger channel and the signal watcher, and drives the
/// relay's teardown.
pub struct ShutdownCoordinator {
    state: ShutdownState,
    trigger_tx: watch::Sender<bool>,
    trigger_rx: watch::Receiver<bool>,
    signal_task: Option<JoinHandle<()>>,
}

impl ShutdownCoordinator {
    /// Create the coordinator and install the SIGINT/SIGTERM watchers.
    pub fn install() -> Result<Self> {
        let (trigger_tx, trigger_rx) = watch::channel(false);
        let signal_task = Some(spawn_signal_watcher(trigger_tx.clone())?);
        Ok(Self {
            state: ShutdownState::Running,
            trigger_tx,
            trigger_rx,
            signal_task,
        })
    }

    /// Request shutdown. Idempotent: repeated triggers have no further
    /// effect once the first has been observed.
    pub fn trigger(&self) {
        let _ = self.trigger_tx.send(true);
    }

    /// Current state of the teardown state machine.
    pub const fn state(&self) -> ShutdownState {
        self.state
    }

    /// Drive the relay until every handle has confirmed closure.
    ///
    /// Returns after `Terminated`. A signal or end-of-stream trigger yields
    /// `Ok(())` so the process exits 0; a failed write on either sink is
    /// unrecoverable and surfaces as [`Error::Io`] after teardown, so the
    /// process exits with that call's error code.
    pub async fn run_until_terminated(mut self, mut paths: RelayPaths) -> Result<()> {
        let mut trigger_rx = self.trigger_rx.clone();
        let mut events_open = true;
        let fatal = loop {
            tokio::select! {
                _ = trigger_rx.changed() => {
                    debug!("Shutdown trigger received");
                    break None;
                }
                event = paths.events_rx.recv(), if events_open => match event {
                    Some(PathEvent::Eof(direction)) => {
                        info!(direction = direction.label(), "End of stream, shutting down");
                        break None;
                    }
                    Some(PathEvent::WriteFailed { direction, error }) => {
                        warn!(direction = direction.label(), error = %error, "Write failed, shutting down");
                        break Some(error);
                    }
                    // Every path stalled without EOF or a write failure;
                    // nothing is left to forward, but only a signal ends
                    // the run.
                    None => {
                        debug!("All paths stalled, waiting for signal");
                        events_open = false;
                    }
                }
            }
        };

        // Stopping: halt everything that initiates I/O. Readers and the
        // signal watcher are cancelled at their next suspend point; their
        // handles (stdin, socket read half) close when the tasks drop them.
        self.advance();
        if let Some(task) = self.signal_task.take() {
            task.abort();
            let _ = task.await;
        }
        for task in &paths.readers {
            task.abort();
        }
        for task in paths.readers.drain(..) {
            let _ = task.await;
        }

        // Closing: with the readers gone the chunk queues are closed, so
        // each writer drains what was already queued, shuts its sink down
        // (socket write half, stdout) and exits. A writer whose sink has
        // stopped accepting bytes is cut off after the grace period and its
        // queued chunks are dropped.
        self.advance();
        for mut task in paths.writers.drain(..) {
            if tokio::time::timeout(DRAIN_GRACE, &mut task).await.is_err() {
                warn!("Writer did not drain in time, dropping queued chunks");
                task.abort();
                let _ = task.await;
            }
        }

        // Terminated: every join above is a confirmed close; no task
        // remains that could touch a handle.
        self.advance();
        info!("Relay terminated");
        match fatal {
            Some(error) => Err(Error::Io(error)),
            None => Ok(()),
        }
    }

    fn advance(&mut self) {
        let next = self.state.next();
        debug!(from = ?self.state, to = ?next, "Shutdown state transition");
        self.state = next;
    }
}

/// Watch for SIGINT and SIGTERM and fan them into the trigger channel.
fn spawn_signal_watcher(trigger: watch::Sender<bool>) -> Result<JoinHandle<()>> {
    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .map_err(|source| Error::SignalSetup { source })?;

    Ok(tokio::spawn(async move {
        #[cfg(unix)]
        let sigterm_future = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_future = std::future::pending::<Option<()>>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C shutdown signal");
            }
            _ = sigterm_future => {
                info!("Received SIGTERM shutdown signal");
            }
        }
        let _ = trigger.send(true);
    }))
}
