//! Process-wide settings, resolved once at startup.

use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for a single Telegram message, slightly under the Bot API's
/// 4096-character cap to leave headroom for formatting.
pub const MESSAGE_LIMIT: usize = 4000;

/// Minimum interval between status-message edits (Bot API edit rate limit).
pub const STATUS_EDIT_INTERVAL: Duration = Duration::from_secs(3);

/// Tools the subprocess may use without prompting.
pub const ALLOWED_TOOLS: &[&str] = &[
    "Bash",
    "Read",
    "Write",
    "Edit",
    "Glob",
    "Grep",
    "WebFetch",
    "WebSearch",
    "Task",
];

/// Settings shared by every handler.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Telegram user id allowed to talk to the bridge.
    pub owner_id: u64,
    /// Model name passed to the CLI.
    pub model: String,
    /// Working directory the CLI runs in.
    pub workspace: PathBuf,
    /// Wall-clock limit for one subprocess turn.
    pub timeout: Duration,
    /// Path to the `claude` binary.
    pub claude_bin: PathBuf,
    /// Directory for files downloaded from the chat.
    pub downloads_dir: PathBuf,
}
