//! The turn driver: subprocess events → status edits → final report.
//!
//! Data flow for one chat message:
//! ```text
//! subprocess stdout → reader thread → NDJSON events → TurnBridge
//!                                                      ↓ (throttled)
//!                                              status-message edits
//! ```
//! The driver owns the turn deadline: a child that outlives it is killed
//! and the turn reports a timeout.

mod bridge;
mod throttle;

pub use bridge::TurnBridge;
pub use throttle::EditThrottle;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use claudelink_core::ndjson::StreamEvent;

use crate::subprocess::TurnProcess;

/// Tuning for one turn.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Wall-clock limit before the child is killed.
    pub timeout: Duration,
    /// Minimum interval between status edits.
    pub edit_interval: Duration,
    /// Status-message length cap.
    pub status_limit: usize,
}

/// Receives throttled status-line updates during a turn.
#[async_trait]
pub trait StatusSink: Send {
    async fn update(&mut self, text: &str);
}

/// What a finished turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The CLI reported a terminal result event.
    Completed { text: String },
    /// The child exceeded the configured timeout and was killed.
    TimedOut { limit: Duration },
    /// The child exited non-zero without reporting a result.
    Failed { exit_code: i32, stderr: String },
    /// The stream closed without a result and the exit looked clean.
    NoResponse { stderr: String },
}

/// Driver output for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    /// Session id to resume next time, when one was reported.
    pub session_id: Option<String>,
    /// Files the assistant wrote, in invocation order.
    pub written_files: Vec<PathBuf>,
}

/// Pump the event stream of one subprocess turn.
///
/// Consumes events until the stream closes or the deadline expires,
/// pushing throttled status updates into `sink`. Status edits are awaited
/// in-loop, so no update can land after the driver returns.
pub async fn drive_turn<S: StatusSink>(
    mut process: TurnProcess,
    mut events: mpsc::Receiver<StreamEvent>,
    config: &TurnConfig,
    sink: &mut S,
) -> TurnReport {
    let mut bridge = TurnBridge::new();
    let mut throttle = EditThrottle::new(config.edit_interval);
    let mut pending = false;
    let deadline = tokio::time::Instant::now() + config.timeout;
    let mut timed_out = false;

    loop {
        let flush_delay = throttle.remaining(std::time::Instant::now());
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    if bridge.ingest(event) {
                        pending = true;
                    }
                    if pending && throttle.try_acquire(std::time::Instant::now()) {
                        sink.update(&bridge.status_text(config.status_limit)).await;
                        pending = false;
                    }
                }
                None => break,
            },
            // Coalesced update: flush the latest status once the interval
            // elapses, even if no further events arrive.
            () = tokio::time::sleep(flush_delay), if pending => {
                if throttle.try_acquire(std::time::Instant::now()) {
                    sink.update(&bridge.status_text(config.status_limit)).await;
                    pending = false;
                }
            },
            () = tokio::time::sleep_until(deadline) => {
                warn!(
                    timeout_secs = config.timeout.as_secs(),
                    "Turn exceeded the timeout, killing subprocess"
                );
                process.kill();
                timed_out = true;
                break;
            }
        }
    }

    let (exit_code, stderr) = process.finish().await;
    let (result, session_id, written_files) = bridge.into_parts();

    let outcome = if timed_out {
        TurnOutcome::TimedOut {
            limit: config.timeout,
        }
    } else if let Some(result) = result {
        info!(
            duration_ms = result.duration_ms,
            cost_usd = ?result.cost_usd,
            is_error = result.is_error,
            "Turn completed"
        );
        TurnOutcome::Completed { text: result.text }
    } else if let Some(exit_code) = exit_code.filter(|&code| code != 0) {
        warn!(exit_code, stderr_bytes = stderr.len(), "Subprocess failed");
        TurnOutcome::Failed { exit_code, stderr }
    } else {
        TurnOutcome::NoResponse { stderr }
    };

    TurnReport {
        outcome,
        session_id,
        written_files,
    }
}
