//! OpenAI chat-completions streaming wire format.
//!
//! Also used for OpenAI-compatible servers (Ollama, vLLM, Together).

use serde::Deserialize;
use serde_json::{Value, json};

use super::ChatRequest;
use super::sse::Frame;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub fn endpoint(base_url: &str) -> String {
    format!("{base_url}/chat/completions")
}

/// Build the request body. OpenAI has no top-k parameter.
pub fn build_body(request: &ChatRequest) -> Value {
    let messages: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.has_text())
        .map(|m| json!({ "role": m.role.to_string(), "content": m.content }))
        .collect();

    json!({
        "model": request.model,
        "messages": messages,
        "stream": true,
        "temperature": request.sampling.temperature,
        "top_p": request.sampling.top_p,
    })
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

pub(crate) fn decode(data: &str) -> Result<Vec<Frame>, serde_json::Error> {
    if data.trim() == "[DONE]" {
        return Ok(vec![Frame::Done]);
    }
    let chunk: StreamChunk = serde_json::from_str(data)?;
    if let Some(err) = chunk.error {
        return Ok(vec![Frame::Failed(err.message)]);
    }

    let mut frames = Vec::new();
    if let Some(choice) = chunk.choices.into_iter().next() {
        if let Some(text) = choice.delta.and_then(|d| d.content) {
            frames.push(Frame::Text(text));
        }
        if choice.finish_reason.as_deref() == Some("content_filter") {
            frames.push(Frame::Blocked("response stopped (content_filter)".to_string()));
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;
    use crate::providers::REVIEW_SAMPLING;

    #[test]
    fn body_streams_with_plain_roles() {
        let body = build_body(&ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            sampling: REVIEW_SAMPLING,
            api_key: "k".to_string(),
        });
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["model"], "gpt-4o-mini");
    }

    #[test]
    fn decodes_deltas_and_done() {
        let data = r#"{"choices":[{"index":0,"delta":{"content":"Hi"},"finish_reason":null}]}"#;
        assert_eq!(decode(data).unwrap(), vec![Frame::Text("Hi".to_string())]);
        assert_eq!(decode("[DONE]").unwrap(), vec![Frame::Done]);
    }

    #[test]
    fn role_only_delta_yields_nothing() {
        let data = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert!(decode(data).unwrap().is_empty());
    }

    #[test]
    fn content_filter_blocks() {
        let data = r#"{"choices":[{"delta":{},"finish_reason":"content_filter"}]}"#;
        assert!(matches!(decode(data).unwrap()[0], Frame::Blocked(_)));
    }
}
