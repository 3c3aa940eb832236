//! Spawning the CLI and streaming its output.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use claudelink_core::ndjson::{self, StreamEvent};

/// Capacity of the stdout hand-off channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long to wait for the stderr drain after the child exits.
const STDERR_DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Grace period for the child to exit after its stdout closes.
const REAP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Configuration for one subprocess turn.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Path to the `claude` binary.
    pub claude_bin: PathBuf,
    /// Prompt text passed via `-p`.
    pub prompt: String,
    /// Session id to resume, if any.
    pub resume_session: Option<String>,
    /// Model name.
    pub model: String,
    /// Working directory for the child.
    pub working_dir: PathBuf,
    /// Tools pre-approved via `--allowedTools`.
    pub allowed_tools: Vec<String>,
}

impl SpawnConfig {
    /// Assemble the CLI argument list. Kept separate from spawning so the
    /// resume behaviour is testable without a child process.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            self.prompt.clone(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
            "--model".to_string(),
            self.model.clone(),
        ];
        if !self.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(self.allowed_tools.join(","));
        }
        if let Some(ref session) = self.resume_session {
            args.push("--resume".to_string());
            args.push(session.clone());
        }
        args
    }
}

/// Errors from launching the CLI.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to spawn the assistant CLI: {reason}")]
    Spawn { reason: String },
}

/// Handle to a running turn's child process.
///
/// The event stream is returned separately by [`spawn_turn`] so the driver
/// can consume it while still holding the handle for kill/reap.
pub struct TurnProcess {
    child: Child,
    stderr_rx: oneshot::Receiver<String>,
}

impl TurnProcess {
    /// Kill the child. Used when the turn deadline expires; the follow-up
    /// [`Self::finish`] call reaps it.
    pub fn kill(&mut self) {
        if let Err(e) = self.child.kill() {
            warn!(error = %e, "Failed to kill subprocess");
        }
    }

    /// Reap the child and collect its stderr. Returns the exit code (None
    /// when killed by a signal) and the trimmed stderr text.
    pub async fn finish(self) -> (Option<i32>, String) {
        let Self {
            mut child,
            stderr_rx,
        } = self;

        let exit_code =
            match tokio::task::spawn_blocking(move || reap_with_timeout(&mut child, REAP_TIMEOUT))
                .await
            {
                Ok(code) => code,
                Err(e) => {
                    warn!(error = %e, "Subprocess wait task failed");
                    None
                }
            };

        // A grandchild inheriting the pipe can keep it open after the child
        // dies; don't wait on stderr forever.
        let stderr = tokio::time::timeout(STDERR_DRAIN_TIMEOUT, stderr_rx)
            .await
            .ok()
            .and_then(Result::ok)
            .unwrap_or_default();
        (exit_code, stderr)
    }
}

/// Spawn the CLI for one turn.
///
/// stdin is nulled so the child can never block on an interactive prompt;
/// stdout feeds the returned event channel via a dedicated reader thread;
/// stderr is drained into a buffer surfaced by [`TurnProcess::finish`].
pub fn spawn_turn(
    config: &SpawnConfig,
) -> Result<(TurnProcess, mpsc::Receiver<StreamEvent>), LaunchError> {
    let mut cmd = Command::new(&config.claude_bin);
    cmd.args(config.to_args())
        .current_dir(&config.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // The CLI refuses to run inside what it detects as another session.
    cmd.env_remove("CLAUDECODE");

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    info!(
        resume = config.resume_session.is_some(),
        model = %config.model,
        working_dir = %config.working_dir.display(),
        "Spawning claude subprocess"
    );

    let mut child = cmd.spawn().map_err(|e| LaunchError::Spawn {
        reason: e.to_string(),
    })?;

    let stdout = child.stdout.take().ok_or_else(|| LaunchError::Spawn {
        reason: "failed to capture stdout".to_string(),
    })?;
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    thread::spawn(move || read_events(BufReader::new(stdout), &event_tx));

    let stderr = child.stderr.take();
    let (stderr_tx, stderr_rx) = oneshot::channel();
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut stderr) = stderr {
            if let Err(e) = stderr.read_to_string(&mut buf) {
                warn!(error = %e, "Failed to read subprocess stderr");
            }
        }
        let _ = stderr_tx.send(buf.trim().to_string());
    });

    Ok((TurnProcess { child, stderr_rx }, event_rx))
}

/// Wait for the child to exit, killing it once the grace period runs out.
/// Blocking; runs on the blocking pool.
fn reap_with_timeout(child: &mut Child, limit: std::time::Duration) -> Option<i32> {
    let start = std::time::Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(?status, "Subprocess exited");
                return status.code();
            }
            Ok(None) if start.elapsed() >= limit => {
                warn!("Subprocess lingered after stream close, killing");
                if let Err(e) = child.kill() {
                    warn!(error = %e, "Failed to kill lingering subprocess");
                }
                return child.wait().ok().and_then(|status| status.code());
            }
            Ok(None) => thread::sleep(std::time::Duration::from_millis(50)),
            Err(e) => {
                warn!(error = %e, "Error waiting for subprocess");
                return None;
            }
        }
    }
}

/// Blocking read loop for the child's stdout.
///
/// One parsed event per well-formed line; malformed lines are skipped with
/// a warning and never surfaced to the chat. Runs until EOF or until the
/// async side drops the receiver.
fn read_events<R: BufRead>(reader: R, tx: &mpsc::Sender<StreamEvent>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to read subprocess stdout");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match ndjson::parse_line(&line) {
            Ok(event) => {
                if tx.blocking_send(event).is_err() {
                    debug!("Event receiver dropped, stopping reader");
                    break;
                }
            }
            Err(e) => {
                let prefix: String = line.chars().take(200).collect();
                warn!(error = %e, line = %prefix, "Skipping malformed stream line");
            }
        }
    }
    debug!("Stdout reader finished");
}
