//! Human-readable one-liners for tool invocations.
//!
//! These feed the live status message in the chat, so they favour brevity
//! over completeness: a path tail or a short pattern, never a full argument
//! dump.

use serde_json::Value;

use crate::ndjson::ToolInvocation;

/// Generate a short description for a tool invocation.
pub fn describe_tool(tool: &ToolInvocation) -> String {
    let input = &tool.input;
    match tool.name.as_str() {
        "Read" => format!("Reading {}", str_field(input, "file_path", 40)),
        "Write" => format!("Writing {}", str_field(input, "file_path", 40)),
        "Edit" => format!("Editing {}", str_field(input, "file_path", 40)),
        "Glob" => format!(
            "Searching for {}",
            input
                .get("pattern")
                .and_then(Value::as_str)
                .unwrap_or("files")
        ),
        "Grep" => format!("Searching code for \"{}\"", str_field(input, "pattern", 60)),
        "Bash" => "Running a command".to_string(),
        "WebSearch" => format!(
            "Searching the web for \"{}\"",
            str_field(input, "query", 60)
        ),
        "WebFetch" => format!("Fetching {}", str_field(input, "url", 60)),
        "Task" => "Running a subtask".to_string(),
        other => format!("Using {other}"),
    }
}

/// Extract a string field, truncated from the left so the informative tail
/// (file name, host) survives.
fn str_field(input: &Value, key: &str, max: usize) -> String {
    input
        .get(key)
        .and_then(Value::as_str)
        .map_or_else(|| "?".to_string(), |s| truncate_start(s, max))
}

/// Keep at most `max` bytes from the end of `s`, prefixing "..." when
/// anything was cut. Respects char boundaries.
pub fn truncate_start(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let start = s
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| s.len() - i <= keep)
        .unwrap_or(s.len());
    format!("...{}", &s[start..])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(name: &str, input: Value) -> ToolInvocation {
        ToolInvocation {
            name: name.to_string(),
            input,
        }
    }

    #[test]
    fn read_shows_file_path() {
        let desc = describe_tool(&tool("Read", json!({"file_path": "src/main.rs"})));
        assert_eq!(desc, "Reading src/main.rs");
    }

    #[test]
    fn bash_hides_the_command() {
        let desc = describe_tool(&tool("Bash", json!({"command": "rm -rf target"})));
        assert_eq!(desc, "Running a command");
    }

    #[test]
    fn grep_quotes_the_pattern() {
        let desc = describe_tool(&tool("Grep", json!({"pattern": "fn main"})));
        assert_eq!(desc, "Searching code for \"fn main\"");
    }

    #[test]
    fn unknown_tool_falls_back_to_name() {
        let desc = describe_tool(&tool("NotebookEdit", json!({"x": 1})));
        assert_eq!(desc, "Using NotebookEdit");
    }

    #[test]
    fn missing_field_shows_placeholder() {
        let desc = describe_tool(&tool("Read", json!({})));
        assert_eq!(desc, "Reading ?");
    }

    #[test]
    fn long_path_keeps_the_tail() {
        let long = format!("/very/deep/{}/lib.rs", "nested/".repeat(20));
        let desc = describe_tool(&tool("Read", json!({ "file_path": long })));
        assert!(desc.starts_with("Reading ..."));
        assert!(desc.ends_with("lib.rs"));
        assert!(desc.len() <= "Reading ".len() + 40);
    }

    #[test]
    fn truncate_start_handles_multibyte_utf8() {
        assert_eq!(truncate_start("short", 10), "short");
        assert_eq!(truncate_start("abcdef", 6), "abcdef");
        // Cut must not land inside the 2-byte 'é'
        let t = truncate_start("éééééééééé", 8);
        assert!(t.starts_with("..."));
        assert!(t.len() <= 8 + 2);
    }
}
