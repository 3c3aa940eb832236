//! Event types decoded from the Claude Code NDJSON stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One decoded line of child-process output.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Assistant message; only its tool-use blocks matter to the bridge.
    Assistant(AssistantEvent),
    /// Terminal event carrying the final answer and the resumable session id.
    Result(TurnResult),
    /// Any other well-formed event. Its session id, if present, is kept.
    Other { session_id: Option<String> },
}

impl StreamEvent {
    /// Session id carried by this event, regardless of variant.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Assistant(a) => a.session_id.as_deref(),
            Self::Result(r) => r.session_id.as_deref(),
            Self::Other { session_id } => session_id.as_deref(),
        }
    }
}

/// Tool-use blocks extracted from one assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantEvent {
    pub tools: Vec<ToolInvocation>,
    pub session_id: Option<String>,
}

/// A single tool invocation: name plus raw input object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub input: Value,
}

/// The terminal `result` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// Final answer text; empty when the CLI reported nothing.
    pub text: String,
    pub session_id: Option<String>,
    pub is_error: bool,
    pub duration_ms: u64,
    pub cost_usd: Option<f64>,
}
