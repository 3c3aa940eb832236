//! Outbound chat surface.
//!
//! A small trait seam over the Bot API so exchange flows can be exercised
//! in tests with a recording fake instead of a live bot.

use std::path::Path;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ParseMode};
use tracing::{debug, warn};

use crate::relay::StatusSink;
use crate::settings::MESSAGE_LIMIT;

/// Everything a turn needs to say to the chat.
#[async_trait]
pub trait ChatOutput: Send + Sync {
    /// Send plain text; returns the new message's id.
    async fn send_message(&self, text: &str) -> anyhow::Result<MessageId>;
    /// Send text as Markdown, falling back to plain text when the platform
    /// rejects the markup.
    async fn send_markdown(&self, text: &str) -> anyhow::Result<()>;
    async fn edit_message(&self, id: MessageId, text: &str) -> anyhow::Result<()>;
    async fn delete_message(&self, id: MessageId) -> anyhow::Result<()>;
    async fn send_photo(&self, path: &Path) -> anyhow::Result<()>;
    async fn send_document(&self, path: &Path) -> anyhow::Result<()>;
}

/// [`ChatOutput`] backed by the Telegram Bot API, bound to one chat.
#[derive(Clone)]
pub struct TelegramChat {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramChat {
    pub const fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl ChatOutput for TelegramChat {
    async fn send_message(&self, text: &str) -> anyhow::Result<MessageId> {
        let sent = self.bot.send_message(self.chat_id, text).await?;
        Ok(sent.id)
    }

    async fn send_markdown(&self, text: &str) -> anyhow::Result<()> {
        let markdown = self
            .bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Markdown)
            .await;
        if let Err(e) = markdown {
            debug!(error = %e, "Markdown send rejected, retrying as plain text");
            self.bot.send_message(self.chat_id, text).await?;
        }
        Ok(())
    }

    async fn edit_message(&self, id: MessageId, text: &str) -> anyhow::Result<()> {
        self.bot.edit_message_text(self.chat_id, id, text).await?;
        Ok(())
    }

    async fn delete_message(&self, id: MessageId) -> anyhow::Result<()> {
        self.bot.delete_message(self.chat_id, id).await?;
        Ok(())
    }

    async fn send_photo(&self, path: &Path) -> anyhow::Result<()> {
        self.bot
            .send_photo(self.chat_id, InputFile::file(path))
            .await?;
        Ok(())
    }

    async fn send_document(&self, path: &Path) -> anyhow::Result<()> {
        self.bot
            .send_document(self.chat_id, InputFile::file(path))
            .await?;
        Ok(())
    }
}

/// Adapts a chat's status message into the driver's [`StatusSink`].
pub struct ChatStatusSink<'a, C: ChatOutput> {
    chat: &'a C,
    status_id: Option<MessageId>,
}

impl<'a, C: ChatOutput> ChatStatusSink<'a, C> {
    pub const fn new(chat: &'a C, status_id: Option<MessageId>) -> Self {
        Self { chat, status_id }
    }
}

#[async_trait]
impl<C: ChatOutput> StatusSink for ChatStatusSink<'_, C> {
    async fn update(&mut self, text: &str) {
        // Edit failures are cosmetic; the turn carries on.
        if let Some(id) = self.status_id {
            if let Err(e) = self.chat.edit_message(id, text).await {
                debug!(error = %e, "Failed to edit status message");
            }
        }
    }
}

/// Split text into chunks of at most `limit` bytes, on char boundaries.
pub fn split_chunks(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        if rest.len() <= limit {
            chunks.push(rest.to_string());
            break;
        }
        let mut end = limit;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        chunks.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    chunks
}

/// Send a (possibly long) reply as chunked Markdown messages.
pub async fn send_chunked<C: ChatOutput + ?Sized>(chat: &C, text: &str) {
    for chunk in split_chunks(text, MESSAGE_LIMIT) {
        if let Err(e) = chat.send_markdown(&chunk).await {
            warn!(error = %e, "Failed to send reply chunk");
        }
    }
}
