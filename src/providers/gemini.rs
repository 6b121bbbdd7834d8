//! Google Gemini `streamGenerateContent` wire format.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::models::{ChatMessage, Role};

use super::ChatRequest;
use super::sse::Frame;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Finish reasons that mean the candidate was withheld.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Streaming endpoint for a model. Accepts ids with or without `models/`.
pub fn endpoint(base_url: &str, model: &str) -> String {
    let model = model.strip_prefix("models/").unwrap_or(model);
    format!("{base_url}/v1beta/models/{model}:streamGenerateContent?alt=sse")
}

/// Gemini labels the assistant side `model`.
fn role_label(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        _ => "user",
    }
}

/// Build the request body. System turns fold into `systemInstruction`.
pub fn build_body(request: &ChatRequest) -> Value {
    let (system, turns): (Vec<&ChatMessage>, Vec<&ChatMessage>) = request
        .messages
        .iter()
        .filter(|m| m.has_text())
        .partition(|m| m.role == Role::System);

    let contents: Vec<Value> = turns
        .iter()
        .map(|m| json!({ "role": role_label(m.role), "parts": [{ "text": m.content }] }))
        .collect();

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "temperature": request.sampling.temperature,
            "topK": request.sampling.top_k,
            "topP": request.sampling.top_p,
        },
    });
    if !system.is_empty() {
        let text = system
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        body["systemInstruction"] = json!({ "parts": [{ "text": text }] });
    }
    body
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

/// Decode one `data:` payload.
pub(crate) fn decode(data: &str) -> Result<Vec<Frame>, serde_json::Error> {
    let chunk: StreamChunk = serde_json::from_str(data)?;

    if let Some(err) = chunk.error {
        return Ok(vec![Frame::Failed(err.message)]);
    }
    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Ok(vec![Frame::Blocked(format!("prompt blocked ({reason})"))]);
    }

    let mut frames = Vec::new();
    for candidate in chunk.candidates.into_iter().take(1) {
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if !text.is_empty() {
            frames.push(Frame::Text(text));
        }
        if let Some(reason) = candidate.finish_reason {
            if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) {
                frames.push(Frame::Blocked(format!("response stopped ({reason})")));
            }
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::REVIEW_SAMPLING;

    fn request(messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: "gemini-1.5-flash-latest".to_string(),
            messages,
            sampling: REVIEW_SAMPLING,
            api_key: "k".to_string(),
        }
    }

    #[test]
    fn endpoint_strips_models_prefix() {
        assert_eq!(
            endpoint("https://g.example", "models/gemini-pro"),
            "https://g.example/v1beta/models/gemini-pro:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn body_maps_roles_and_system_instruction() {
        let body = build_body(&request(vec![
            ChatMessage::system("be strict"),
            ChatMessage::user("review"),
            ChatMessage::assistant("ok"),
            ChatMessage::user(""),
        ]));

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be strict");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2, "blank turns are dropped");
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(body["generationConfig"]["topK"], 1);
    }

    #[test]
    fn decodes_text_parts() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"Hel"},{"text":"lo"}],"role":"model"}}]}"#;
        assert_eq!(decode(data).unwrap(), vec![Frame::Text("Hello".to_string())]);
    }

    #[test]
    fn safety_finish_reason_blocks_after_text() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"par"}]},"finishReason":"SAFETY"}]}"#;
        let frames = decode(data).unwrap();
        assert_eq!(frames[0], Frame::Text("par".to_string()));
        assert!(matches!(frames[1], Frame::Blocked(_)));
    }

    #[test]
    fn prompt_block_reason_blocks() {
        let data = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(decode(data).unwrap()[0], Frame::Blocked(_)));
    }

    #[test]
    fn stop_finish_reason_is_not_a_block() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"."}]},"finishReason":"STOP"}]}"#;
        assert_eq!(decode(data).unwrap(), vec![Frame::Text(".".to_string())]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(decode("not json").is_err());
    }
}
