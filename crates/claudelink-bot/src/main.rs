//! claudelink
//!
//! Telegram bridge for the Claude Code CLI: forwards the owner's chat
//! messages to a per-message `claude` subprocess and relays streamed
//! progress and the final answer back into the chat.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use teloxide::Bot;
use tracing::info;

use claudelink_bot::settings::Settings;
use claudelink_bot::telegram;

#[derive(Parser, Debug)]
#[command(name = "claudelink")]
#[command(version, about = "claudelink - Telegram bridge for the Claude Code CLI")]
struct Args {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    bot_token: String,

    /// Telegram user id allowed to talk to the bridge
    #[arg(long, env = "OWNER_TELEGRAM_ID")]
    owner_id: u64,

    /// Model passed to the CLI
    #[arg(long, default_value = "opus", env = "CLAUDE_MODEL")]
    model: String,

    /// Working directory the CLI runs in
    #[arg(long, default_value = ".", env = "WORKSPACE_DIR")]
    workspace: PathBuf,

    /// Seconds before an in-flight turn is killed
    #[arg(long, default_value_t = 600, env = "COMMAND_TIMEOUT")]
    timeout: u64,

    /// Path to the `claude` CLI binary
    #[arg(long, default_value = "claude", env = "CLAUDE_BIN")]
    claude_bin: PathBuf,

    /// Directory for files downloaded from the chat
    #[arg(long, env = "CLAUDELINK_DOWNLOADS_DIR")]
    downloads_dir: Option<PathBuf>,

    /// Log level filter (e.g. "info", "debug", "warn")
    #[arg(long, default_value = "info", env = "CLAUDELINK_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation)
    #[arg(long, env = "CLAUDELINK_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap resolves env-backed arguments.
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_filter = format!(
        "claudelink_bot={level},claudelink_core={level}",
        level = args.log_level
    );
    claudelink_core::tracing_init::init_tracing(&log_filter, args.log_json);

    let downloads_dir = match args.downloads_dir {
        Some(dir) => dir,
        None => default_downloads_dir()?,
    };
    tokio::fs::create_dir_all(&downloads_dir).await?;

    let settings = Settings {
        owner_id: args.owner_id,
        model: args.model,
        workspace: args.workspace,
        timeout: Duration::from_secs(args.timeout),
        claude_bin: args.claude_bin,
        downloads_dir,
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        model = %settings.model,
        workspace = %settings.workspace.display(),
        timeout_secs = settings.timeout.as_secs(),
        "Starting claudelink"
    );

    let bot = Bot::new(args.bot_token);
    telegram::run_bot(bot, settings).await
}

/// Default downloads directory: ~/.claudelink/downloads/
fn default_downloads_dir() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".claudelink").join("downloads"))
}
