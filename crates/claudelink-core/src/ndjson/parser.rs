//! Tolerant decoder for stream-json lines.

use serde_json::Value;

use super::types::{AssistantEvent, StreamEvent, ToolInvocation, TurnResult};
use crate::error::{Error, Result};

/// Parse a single NDJSON line from the CLI's stdout.
pub fn parse_line(line: &str) -> Result<StreamEvent> {
    let raw: Value = serde_json::from_str(line)?;
    parse_value(&raw)
}

/// Parse a JSON value into a stream event.
pub fn parse_value(raw: &Value) -> Result<StreamEvent> {
    let msg_type = raw
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Parse("missing 'type' field".into()))?;

    match msg_type {
        "assistant" => Ok(StreamEvent::Assistant(parse_assistant(raw))),
        "result" => Ok(StreamEvent::Result(parse_result(raw))),
        _ => {
            tracing::debug!(msg_type, "Unhandled stream event type");
            Ok(StreamEvent::Other {
                session_id: session_id_of(raw),
            })
        }
    }
}

fn session_id_of(raw: &Value) -> Option<String> {
    raw.get("session_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn parse_assistant(raw: &Value) -> AssistantEvent {
    // The CLI wraps the API message under "message"; older events inline it.
    let msg = raw.get("message").unwrap_or(raw);

    let tools = msg
        .get("content")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|block| {
                    if block.get("type")?.as_str()? != "tool_use" {
                        return None;
                    }
                    Some(ToolInvocation {
                        name: block.get("name")?.as_str()?.to_string(),
                        input: block.get("input").cloned().unwrap_or(Value::Null),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    AssistantEvent {
        tools,
        session_id: session_id_of(raw),
    }
}

fn parse_result(raw: &Value) -> TurnResult {
    TurnResult {
        text: raw
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        session_id: session_id_of(raw),
        is_error: raw
            .get("is_error")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        duration_ms: raw
            .get("duration_ms")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        cost_usd: raw.get("total_cost_usd").and_then(Value::as_f64),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_result_event() {
        let json = r#"{"type":"result","subtype":"success","result":"All done.","session_id":"abc123","duration_ms":4200,"total_cost_usd":0.03}"#;
        let event = parse_line(json).unwrap();
        match event {
            StreamEvent::Result(r) => {
                assert_eq!(r.text, "All done.");
                assert_eq!(r.session_id.as_deref(), Some("abc123"));
                assert!(!r.is_error);
                assert_eq!(r.duration_ms, 4200);
                assert_eq!(r.cost_usd, Some(0.03));
            }
            other => panic!("expected Result, got {other:?}"),
        }
    }

    #[test]
    fn parse_assistant_extracts_tool_use_blocks() {
        let json = r#"{"type":"assistant","session_id":"s1","message":{"content":[
            {"type":"text","text":"Let me look."},
            {"type":"tool_use","id":"t1","name":"Read","input":{"file_path":"/tmp/a.rs"}},
            {"type":"tool_use","id":"t2","name":"Bash","input":{"command":"ls"}}
        ]}}"#;
        let event = parse_line(json).unwrap();
        match event {
            StreamEvent::Assistant(a) => {
                assert_eq!(a.tools.len(), 2);
                assert_eq!(a.tools[0].name, "Read");
                assert_eq!(a.tools[1].name, "Bash");
                assert_eq!(a.session_id.as_deref(), Some("s1"));
            }
            other => panic!("expected Assistant, got {other:?}"),
        }
    }

    #[test]
    fn assistant_without_tool_use_has_empty_tools() {
        let json = r#"{"type":"assistant","message":{"content":[{"type":"text","text":"hi"}]}}"#;
        let event = parse_line(json).unwrap();
        match event {
            StreamEvent::Assistant(a) => assert!(a.tools.is_empty()),
            other => panic!("expected Assistant, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_keeps_session_id() {
        let json = r#"{"type":"system","subtype":"init","session_id":"sess-9","model":"m"}"#;
        let event = parse_line(json).unwrap();
        assert_eq!(
            event,
            StreamEvent::Other {
                session_id: Some("sess-9".into())
            }
        );
    }

    #[test]
    fn empty_session_id_is_dropped() {
        let json = r#"{"type":"system","session_id":""}"#;
        let event = parse_line(json).unwrap();
        assert_eq!(event.session_id(), None);
    }

    #[test]
    fn missing_type_is_an_error() {
        let json = r#"{"result":"text without a discriminator"}"#;
        assert!(parse_line(json).is_err());
    }

    #[test]
    fn non_json_line_is_an_error() {
        assert!(parse_line("Execution error: something broke").is_err());
    }

    #[test]
    fn tolerant_reader_ignores_unknown_fields() {
        let json = r#"{"type":"result","result":"ok","session_id":"x","future_field":[1,2,3]}"#;
        assert!(parse_line(json).is_ok());
    }

    #[test]
    fn result_error_flag_is_captured() {
        let json = r#"{"type":"result","subtype":"error","is_error":true,"result":"","session_id":"x"}"#;
        match parse_line(json).unwrap() {
            StreamEvent::Result(r) => assert!(r.is_error),
            other => panic!("expected Result, got {other:?}"),
        }
    }
}
