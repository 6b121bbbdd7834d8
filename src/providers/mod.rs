//! ChatProvider trait and LLM streaming integration.
//!
//! The orchestrator only sees [`ChatProvider`]: an ordered message list
//! goes in, an ordered stream of text deltas comes out. Wire formats for
//! each hosted provider live in their own module.

pub mod anthropic;
pub mod gemini;
pub mod http;
pub mod openai;
mod sse;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::models::{ChatMessage, ProviderName};

pub use http::HttpChatProvider;

/// Ordered, non-restartable stream of text deltas.
pub type TextStream = BoxStream<'static, Result<String, ProviderError>>;

/// Errors from an LLM provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} API error (HTTP {status}): {message}")]
    Api {
        provider: ProviderName,
        status: u16,
        message: String,
    },

    #[error("{provider} request failed: {source}")]
    Http {
        provider: ProviderName,
        source: reqwest::Error,
    },

    #[error("response blocked by {provider} safety filter: {reason}")]
    Blocked {
        provider: ProviderName,
        reason: String,
    },

    #[error("{provider} stream interrupted: {message}")]
    Stream {
        provider: ProviderName,
        message: String,
    },

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Upstream HTTP status, when the provider answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Sampling parameters sent with every review.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
}

/// Moderately creative text, near-greedy token choice.
pub const REVIEW_SAMPLING: SamplingParams = SamplingParams {
    temperature: 0.7,
    top_k: 1,
    top_p: 1.0,
};

impl Default for SamplingParams {
    fn default() -> Self {
        REVIEW_SAMPLING
    }
}

/// One streaming chat call.
#[derive(Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub sampling: SamplingParams,
    pub api_key: String,
}

impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRequest")
            .field("model", &self.model)
            .field("messages", &self.messages.len())
            .field("sampling", &self.sampling)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// A streaming chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> ProviderName;

    /// Start a streaming completion.
    ///
    /// Errors before the first byte (bad key, unknown model, quota) are
    /// returned directly; failures after that arrive as the stream's last
    /// item.
    async fn stream_chat(&self, request: ChatRequest) -> Result<TextStream, ProviderError>;
}

/// Pull a human-readable message out of a provider error body.
///
/// Gemini, OpenAI and Anthropic all use `{"error": {"message": ...}}`.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.get("message")?.as_str().map(String::from))
        .unwrap_or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                "<no body>".to_string()
            } else if body.chars().count() > 500 {
                format!("{}...", body.chars().take(500).collect::<String>())
            } else {
                body.to_string()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_sampling_is_near_greedy() {
        let s = SamplingParams::default();
        assert_eq!(s.temperature, 0.7);
        assert_eq!(s.top_k, 1);
        assert_eq!(s.top_p, 1.0);
    }

    #[test]
    fn error_message_prefers_structured_body() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "API key not valid.");
        assert_eq!(error_message("upstream exploded"), "upstream exploded");
        assert_eq!(error_message(""), "<no body>");
    }

    #[test]
    fn request_debug_hides_key() {
        let req = ChatRequest {
            model: "m".to_string(),
            messages: vec![],
            sampling: REVIEW_SAMPLING,
            api_key: "sk-secret".to_string(),
        };
        assert!(!format!("{req:?}").contains("sk-secret"));
    }

    #[test]
    fn api_error_exposes_status() {
        let err = ProviderError::Api {
            provider: ProviderName::Gemini,
            status: 429,
            message: "quota".to_string(),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.to_string(), "gemini API error (HTTP 429): quota");
    }
}
