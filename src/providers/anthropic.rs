//! Anthropic Messages API streaming wire format.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::models::Role;

use super::ChatRequest;
use super::sse::Frame;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";

/// The Messages API requires an explicit output ceiling.
const MAX_TOKENS: u32 = 8192;

pub fn endpoint(base_url: &str) -> String {
    format!("{base_url}/v1/messages")
}

/// Build the request body. System turns become the top-level `system`.
pub fn build_body(request: &ChatRequest) -> Value {
    let system = request
        .messages
        .iter()
        .filter(|m| m.role == Role::System && m.has_text())
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let messages: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System && m.has_text())
        .map(|m| json!({ "role": m.role.to_string(), "content": m.content }))
        .collect();

    let mut body = json!({
        "model": request.model,
        "max_tokens": MAX_TOKENS,
        "messages": messages,
        "stream": true,
        "temperature": request.sampling.temperature,
        "top_k": request.sampling.top_k,
    });
    if !system.is_empty() {
        body["system"] = Value::String(system);
    }
    body
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockDelta { delta: BlockDelta },
    MessageDelta { delta: MessageDelta },
    MessageStop,
    Error { error: EventError },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventError {
    #[serde(default)]
    message: String,
}

pub(crate) fn decode(data: &str) -> Result<Vec<Frame>, serde_json::Error> {
    let frame = match serde_json::from_str::<StreamEvent>(data)? {
        StreamEvent::ContentBlockDelta {
            delta: BlockDelta::TextDelta { text },
        } => Some(Frame::Text(text)),
        StreamEvent::MessageDelta { delta } if delta.stop_reason.as_deref() == Some("refusal") => {
            Some(Frame::Blocked("response stopped (refusal)".to_string()))
        }
        StreamEvent::MessageStop => Some(Frame::Done),
        StreamEvent::Error { error } => Some(Frame::Failed(error.message)),
        _ => None,
    };
    Ok(frame.into_iter().collect())
}
