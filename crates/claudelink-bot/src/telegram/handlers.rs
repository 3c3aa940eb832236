//! Inbound update handling: access guard, command router, message flow.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{ChatAction, User};
use tracing::{debug, error, info, warn};

use crate::relay::{TurnConfig, TurnOutcome, drive_turn};
use crate::settings::{ALLOWED_TOOLS, MESSAGE_LIMIT, STATUS_EDIT_INTERVAL};
use crate::subprocess::{SpawnConfig, spawn_turn};

use super::outbound::{ChatOutput, ChatStatusSink, TelegramChat, send_chunked};
use super::{BotState, Command, files};

/// Access guard: only the configured owner may talk to the bridge.
/// Everyone else is dropped silently, content unlogged.
pub fn is_owner(owner_id: u64, from: Option<&User>) -> bool {
    from.is_some_and(|user| user.id.0 == owner_id)
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    if !is_owner(state.settings.owner_id, msg.from.as_ref()) {
        debug!(chat_id = msg.chat.id.0, "Dropping command from non-owner");
        return Ok(());
    }

    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, "claudelink online. Send me anything.")
                .await?;
        }
        Command::Clear => {
            state.session.lock().await.clear();
            if let Err(e) = files::reset_downloads_dir(&state.settings.downloads_dir).await {
                warn!(error = %e, "Failed to reset downloads directory");
            }
            info!("Session cleared");
            bot.send_message(msg.chat.id, "Session reset. Next message starts fresh.")
                .await?;
        }
        Command::Status => {
            let text = {
                let session = state.session.lock().await;
                format!(
                    "Session: {}\nMessages: {}\nModel: {}",
                    session.short_id(),
                    session.message_count(),
                    state.settings.model
                )
            };
            bot.send_message(msg.chat.id, text).await?;
        }
    }
    Ok(())
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    if !is_owner(state.settings.owner_id, msg.from.as_ref()) {
        debug!(chat_id = msg.chat.id.0, "Dropping message from non-owner");
        return Ok(());
    }

    let text = msg.text().or_else(|| msg.caption()).unwrap_or_default();

    let mut file_paths = Vec::new();
    if let Some(photo) = msg.photo().and_then(<[_]>::last) {
        match files::download_photo(&bot, photo, &state.settings.downloads_dir).await {
            Ok(path) => file_paths.push(path),
            Err(e) => warn!(error = %e, "Failed to download photo"),
        }
    }
    if let Some(document) = msg.document() {
        match files::download_document(&bot, document, &state.settings.downloads_dir).await {
            Ok(path) => file_paths.push(path),
            Err(e) => warn!(error = %e, "Failed to download document"),
        }
    }

    let Some(prompt) = build_prompt(text, &file_paths) else {
        return Ok(());
    };

    info!(
        chat_id = msg.chat.id.0,
        prompt_chars = prompt.chars().count(),
        attachments = file_paths.len(),
        "Message from owner"
    );

    // Typing indicator for the duration of the turn.
    let typing_bot = bot.clone();
    let chat_id = msg.chat.id;
    let typing = tokio::spawn(async move {
        loop {
            let _ = typing_bot
                .send_chat_action(chat_id, ChatAction::Typing)
                .await;
            tokio::time::sleep(Duration::from_secs(4)).await;
        }
    });

    let chat = TelegramChat::new(bot, msg.chat.id);
    run_exchange(&chat, &state, prompt).await;
    typing.abort();

    Ok(())
}

/// Build the subprocess prompt from message text and downloaded files.
/// `None` means there is nothing to forward.
pub fn build_prompt(text: &str, file_paths: &[PathBuf]) -> Option<String> {
    if file_paths.is_empty() {
        return (!text.is_empty()).then(|| text.to_string());
    }

    let refs = file_paths
        .iter()
        .map(|p| format!("- {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");
    let user_text = if text.is_empty() {
        "Please examine the file(s) above and describe what you see."
    } else {
        text
    };
    Some(format!(
        "I'm sending you file(s). Use the Read tool to read each one:\n{refs}\n\n{user_text}"
    ))
}

/// Run one full exchange against the chat.
///
/// Order is fixed: status message up → subprocess turn → status message
/// cleared → final reply → written files → session update. The turn lock
/// keeps a second message from spawning an overlapping subprocess.
pub async fn run_exchange<C: ChatOutput>(chat: &C, state: &BotState, prompt: String) {
    let Ok(_turn) = state.turn_lock.try_lock() else {
        let _ = chat
            .send_message("Still working on the previous message.")
            .await;
        return;
    };

    let resume = state
        .session
        .lock()
        .await
        .session_id()
        .map(ToString::to_string);

    let status_id = match chat.send_message("Working...").await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(error = %e, "Failed to send status message");
            None
        }
    };

    let spawn = SpawnConfig {
        claude_bin: state.settings.claude_bin.clone(),
        prompt,
        resume_session: resume,
        model: state.settings.model.clone(),
        working_dir: state.settings.workspace.clone(),
        allowed_tools: ALLOWED_TOOLS.iter().map(|s| (*s).to_string()).collect(),
    };

    let report = match spawn_turn(&spawn) {
        Ok((process, events)) => {
            let config = TurnConfig {
                timeout: state.settings.timeout,
                edit_interval: STATUS_EDIT_INTERVAL,
                status_limit: MESSAGE_LIMIT,
            };
            let mut sink = ChatStatusSink::new(chat, status_id);
            drive_turn(process, events, &config, &mut sink).await
        }
        Err(e) => {
            error!(error = %e, "Failed to launch the assistant CLI");
            clear_status(chat, status_id).await;
            let _ = chat.send_message(&format!("Error: {e}")).await;
            return;
        }
    };

    // The status message always goes away before the final reply.
    clear_status(chat, status_id).await;

    let reply = match &report.outcome {
        TurnOutcome::Completed { text } if text.is_empty() => "(no response)".to_string(),
        TurnOutcome::Completed { text } => text.clone(),
        TurnOutcome::TimedOut { limit } => format!(
            "Timed out after {}min. Try breaking it into smaller asks.",
            limit.as_secs() / 60
        ),
        TurnOutcome::Failed { exit_code, stderr } => format!("Error (exit {exit_code}): {stderr}"),
        TurnOutcome::NoResponse { stderr } if stderr.is_empty() => "(no response)".to_string(),
        TurnOutcome::NoResponse { stderr } => stderr.clone(),
    };
    send_chunked(chat, &reply).await;

    {
        let mut session = state.session.lock().await;
        session.record_exchange(report.session_id.clone());
    }

    files::send_written_files(chat, &state.settings.workspace, &report.written_files).await;
}

async fn clear_status<C: ChatOutput>(chat: &C, status_id: Option<teloxide::types::MessageId>) {
    if let Some(id) = status_id {
        // The message may already be gone; not worth failing the turn over.
        if let Err(e) = chat.delete_message(id).await {
            debug!(error = %e, "Failed to delete status message");
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use teloxide::types::UserId;

    fn user(id: u64) -> User {
        User {
            id: UserId(id),
            is_bot: false,
            first_name: "Owner".to_string(),
            last_name: None,
            username: None,
            language_code: None,
            is_premium: false,
            added_to_attachment_menu: false,
        }
    }

    #[test]
    fn owner_passes_the_guard() {
        let owner = user(42);
        assert!(is_owner(42, Some(&owner)));
    }

    #[test]
    fn other_senders_are_rejected() {
        let stranger = user(7);
        assert!(!is_owner(42, Some(&stranger)));
    }

    #[test]
    fn missing_sender_is_rejected() {
        assert!(!is_owner(42, None));
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(build_prompt("hello", &[]), Some("hello".to_string()));
    }

    #[test]
    fn empty_message_without_files_is_dropped() {
        assert_eq!(build_prompt("", &[]), None);
    }

    #[test]
    fn files_are_referenced_in_the_prompt() {
        let prompt = build_prompt("what is this?", &[PathBuf::from("/dl/photo_1.jpg")])
            .expect("prompt should be built");
        assert!(prompt.contains("- /dl/photo_1.jpg"));
        assert!(prompt.contains("Use the Read tool"));
        assert!(prompt.ends_with("what is this?"));
    }

    #[test]
    fn caption_less_files_get_a_default_instruction() {
        let prompt =
            build_prompt("", &[PathBuf::from("/dl/doc.pdf")]).expect("prompt should be built");
        assert!(prompt.contains("describe what you see"));
    }
}
