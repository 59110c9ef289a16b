//! Decoding of the Claude CLI's `--output-format stream-json` lines.
//!
//! Each stdout line is one JSON object. [`decode_line`] turns a line into zero
//! or more [`AgentEvent`]s; lines that are not JSON come back as raw events so
//! nothing the agent prints is lost to signal scanning.

use serde::Deserialize;
use serde_json::Value;

use crate::agent::{AgentEvent, EventKind};
use crate::util::truncate_chars;

/// Events from Claude CLI's stream-json output format
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "assistant")]
    Assistant {
        message: StreamMessage,
        #[serde(default)]
        session_id: String,
    },

    #[serde(rename = "user")]
    User { message: StreamMessage },

    #[serde(rename = "result")]
    Result {
        #[serde(default)]
        subtype: String,
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        is_error: bool,
    },

    #[serde(rename = "system")]
    System {
        #[serde(default)]
        subtype: String,
    },

    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct StreamMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "tool_use")]
    ToolUse {
        name: String,
        #[serde(default)]
        input: Value,
    },

    #[serde(rename = "tool_result")]
    ToolResult {
        #[serde(default)]
        content: Value,
        #[serde(default)]
        is_error: bool,
    },

    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "thinking")]
    Thinking {
        #[serde(default)]
        thinking: String,
    },

    #[serde(other)]
    Other,
}

impl StreamEvent {
    /// Flatten a wire event into agent events, one per content block.
    pub fn into_events(self) -> Vec<AgentEvent> {
        match self {
            StreamEvent::Assistant { message, .. } | StreamEvent::User { message } => message
                .content
                .into_iter()
                .filter_map(ContentBlock::into_event)
                .collect(),
            StreamEvent::Result {
                subtype,
                result,
                is_error,
            } => {
                let text = result.unwrap_or_default();
                let kind = if is_error {
                    EventKind::Error
                } else {
                    EventKind::FinalResult
                };
                let text = if is_error && text.is_empty() {
                    format!("agent reported error ({})", subtype)
                } else {
                    text
                };
                vec![AgentEvent::new(kind, text)]
            }
            StreamEvent::System { subtype } => vec![AgentEvent::new(EventKind::System, subtype)],
            StreamEvent::Unknown => Vec::new(),
        }
    }
}

impl ContentBlock {
    fn into_event(self) -> Option<AgentEvent> {
        match self {
            ContentBlock::Text { text } => Some(AgentEvent::new(EventKind::Text, text)),
            ContentBlock::ToolUse { name, input } => Some(AgentEvent::new(
                EventKind::ToolUse,
                describe_tool_use(&name, &input),
            )),
            ContentBlock::ToolResult { content, is_error } => {
                let text = tool_result_text(&content);
                let kind = if is_error {
                    EventKind::Error
                } else {
                    EventKind::ToolResult
                };
                Some(AgentEvent::new(kind, text))
            }
            ContentBlock::Thinking { .. } | ContentBlock::Other => None,
        }
    }
}

/// Decode one stdout line. Blank lines yield nothing.
pub fn decode_line(line: &str) -> Vec<AgentEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed.starts_with('{')
        && let Ok(event) = serde_json::from_str::<StreamEvent>(trimmed)
    {
        return event.into_events();
    }
    vec![AgentEvent::new(EventKind::Raw, trimmed)]
}

/// Tool results arrive either as a plain string or as a list of text blocks.
fn tool_result_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Extract a human-readable description from a tool use event
pub fn describe_tool_use(name: &str, input: &Value) -> String {
    let field = |key: &str| input.get(key).and_then(Value::as_str);
    let path = || {
        field("file_path")
            .map(shorten_path)
            .unwrap_or_else(|| "file".to_string())
    };
    match name {
        "Read" => format!("Reading: {}", path()),
        "Write" => format!("Creating: {}", path()),
        "Edit" => format!("Editing: {}", path()),
        "Bash" => format!(
            "Running: {}",
            field("command")
                .map(|c| truncate_chars(c, 80))
                .unwrap_or_else(|| "command".into())
        ),
        "Glob" => format!("Searching: {}", field("pattern").unwrap_or("*")),
        "Grep" => format!(
            "Grep: {}",
            field("pattern")
                .map(|p| truncate_chars(p, 30))
                .unwrap_or_else(|| "pattern".into())
        ),
        _ => name.to_string(),
    }
}

/// Shorten a file path to just the last 2 components
fn shorten_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() <= 2 {
        path.to_string()
    } else {
        parts[parts.len() - 2..].join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_assistant_text_and_tool_use() {
        let line = r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Creating files"},{"type":"tool_use","name":"Write","input":{"file_path":"/tmp/site/app/page.tsx"},"id":"1"}]},"session_id":"abc"}"#;
        let events = decode_line(line);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Text);
        assert_eq!(events[0].text, "Creating files");
        assert_eq!(events[1].kind, EventKind::ToolUse);
        assert_eq!(events[1].text, "Creating: app/page.tsx");
    }

    #[test]
    fn test_decode_tool_result_string_and_blocks() {
        let line = r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"1","content":"https://github.com/acme/site"}]}}"#;
        let events = decode_line(line);
        assert_eq!(events[0].kind, EventKind::ToolResult);
        assert_eq!(events[0].text, "https://github.com/acme/site");

        let line = r#"{"type":"user","message":{"content":[{"type":"tool_result","content":[{"type":"text","text":"a"},{"type":"text","text":"b"}]}]}}"#;
        assert_eq!(decode_line(line)[0].text, "a\nb");
    }

    #[test]
    fn test_decode_failed_tool_result_is_error() {
        let line = r#"{"type":"user","message":{"content":[{"type":"tool_result","content":"command not found","is_error":true}]}}"#;
        assert_eq!(decode_line(line)[0].kind, EventKind::Error);
    }

    #[test]
    fn test_decode_result() {
        let line = r#"{"type":"result","subtype":"success","result":"SAFE TO DEPLOY","is_error":false}"#;
        let events = decode_line(line);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::FinalResult);
        assert_eq!(events[0].text, "SAFE TO DEPLOY");
    }

    #[test]
    fn test_decode_error_result_without_text() {
        let line = r#"{"type":"result","subtype":"error_max_turns","is_error":true}"#;
        let events = decode_line(line);
        assert_eq!(events[0].kind, EventKind::Error);
        assert!(events[0].text.contains("error_max_turns"));
    }

    #[test]
    fn test_decode_system_and_unknown() {
        let events = decode_line(r#"{"type":"system","subtype":"init","cwd":"/tmp"}"#);
        assert_eq!(events[0].kind, EventKind::System);
        assert_eq!(events[0].text, "init");
        assert!(decode_line(r#"{"type":"stream_event","event":{}}"#).is_empty());
    }

    #[test]
    fn test_thinking_blocks_are_dropped() {
        let line = r#"{"type":"assistant","message":{"content":[{"type":"thinking","thinking":"hmm"}]}}"#;
        assert!(decode_line(line).is_empty());
    }

    #[test]
    fn test_non_json_line_is_raw() {
        let events = decode_line("  Deployed to https://acme.vercel.app  ");
        assert_eq!(events[0].kind, EventKind::Raw);
        assert_eq!(events[0].text, "Deployed to https://acme.vercel.app");
        assert!(decode_line("   ").is_empty());
    }

    #[test]
    fn test_describe_tool_use() {
        let input = serde_json::json!({"file_path": "/Users/foo/project/src/main.rs"});
        assert_eq!(describe_tool_use("Read", &input), "Reading: src/main.rs");

        let input = serde_json::json!({"command": "npm run build"});
        assert_eq!(describe_tool_use("Bash", &input), "Running: npm run build");

        assert_eq!(describe_tool_use("WebFetch", &Value::Null), "WebFetch");
    }
}
