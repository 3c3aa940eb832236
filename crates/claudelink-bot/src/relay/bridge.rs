//! Turn state accumulated from stream events.

use std::path::PathBuf;

use serde_json::Value;
use tracing::info;

use claudelink_core::describe::describe_tool;
use claudelink_core::ndjson::{StreamEvent, TurnResult};

/// Folds the event stream of one subprocess turn into presentable state:
/// the running tool log for the status message, files the assistant wrote,
/// the latest session id, and the terminal result.
#[derive(Debug, Default)]
pub struct TurnBridge {
    tool_log: Vec<String>,
    written_files: Vec<PathBuf>,
    session_id: Option<String>,
    result: Option<TurnResult>,
}

impl TurnBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the turn state. Returns true when the status
    /// line changed and a (throttled) edit should follow.
    pub fn ingest(&mut self, event: StreamEvent) -> bool {
        if let Some(id) = event.session_id() {
            self.session_id = Some(id.to_string());
        }

        match event {
            StreamEvent::Assistant(assistant) => {
                let mut changed = false;
                for tool in assistant.tools {
                    if tool.name == "Write" {
                        if let Some(path) = tool.input.get("file_path").and_then(Value::as_str) {
                            self.written_files.push(PathBuf::from(path));
                        }
                    }
                    let desc = describe_tool(&tool);
                    info!(tool = %tool.name, "{desc}");
                    self.tool_log.push(desc);
                    changed = true;
                }
                changed
            }
            StreamEvent::Result(result) => {
                self.result = Some(result);
                false
            }
            StreamEvent::Other { .. } => false,
        }
    }

    /// Current status-message text: the tool log, truncated from the start
    /// so the most recent activity stays visible.
    pub fn status_text(&self, limit: usize) -> String {
        if self.tool_log.is_empty() {
            return "Working...".to_string();
        }
        let text = self.tool_log.join("\n");
        if text.len() <= limit {
            return text;
        }
        let start = text
            .char_indices()
            .map(|(i, _)| i)
            .find(|&i| text.len() - i <= limit)
            .unwrap_or(0);
        text[start..].to_string()
    }

    pub const fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Consume the bridge: terminal result, captured session id, and the
    /// files written during the turn.
    pub fn into_parts(self) -> (Option<TurnResult>, Option<String>, Vec<PathBuf>) {
        (self.result, self.session_id, self.written_files)
    }
}
