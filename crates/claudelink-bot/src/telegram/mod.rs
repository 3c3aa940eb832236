//! Telegram front-end: dispatcher wiring, command router, access guard.

pub mod files;
pub mod handlers;
pub mod outbound;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::session::SessionState;
use crate::settings::Settings;

/// Slash-commands recognized by the bridge.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "claudelink commands:")]
pub enum Command {
    #[command(description = "check the bridge is alive")]
    Start,
    #[command(description = "forget the session and start fresh")]
    Clear,
    #[command(description = "show session state")]
    Status,
}

/// State shared by every handler.
pub struct BotState {
    pub settings: Settings,
    pub session: Mutex<SessionState>,
    /// Held for the duration of a turn: one subprocess per chat at a time.
    pub(crate) turn_lock: Mutex<()>,
}

impl BotState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            session: Mutex::new(SessionState::default()),
            turn_lock: Mutex::new(()),
        }
    }
}

/// Run the long-polling dispatcher until shutdown.
pub async fn run_bot(bot: Bot, settings: Settings) -> anyhow::Result<()> {
    let me = bot.get_me().await?;
    info!(
        username = me.username.as_deref().unwrap_or("unknown"),
        "Bot authenticated"
    );

    // A leftover webhook silently breaks long polling.
    if let Err(e) = bot.delete_webhook().await {
        warn!(error = %e, "Failed to delete webhook, continuing");
    }

    let state = Arc::new(BotState::new(settings));

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handlers::handle_command),
        )
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|update| async move {
            debug!(update_id = ?update.id, "Unhandled update");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
