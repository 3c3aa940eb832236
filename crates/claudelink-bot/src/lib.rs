//! claudelink bot
//!
//! Telegram front-end for the Claude Code CLI: the owner's messages are
//! forwarded to a per-message `claude` subprocess and the streamed progress
//! and final answer are relayed back into the chat.

pub mod relay;
pub mod session;
pub mod settings;
pub mod subprocess;
pub mod telegram;
