//! Shared types used across all modules.
//!
//! Chat turns, uploaded files, pull-request content, and provider names
//! live here so the client, server, and providers agree on one vocabulary.

pub mod file;
pub mod message;
pub mod pr;

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use file::{SubmittedFile, UploadedFile};
pub use message::Message;
pub use pr::{FileStatus, PrContent, PrSummaryFile};

/// Author of a chat turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One turn as exchanged on the wire and handed to providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Whether the turn carries any non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Supported LLM provider backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
    /// Any OpenAI-compatible API (e.g. Ollama, Together, local servers).
    #[serde(rename = "openai-compatible")]
    OpenAICompatible,
    Anthropic,
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderName::Gemini => write!(f, "gemini"),
            ProviderName::OpenAI => write!(f, "openai"),
            ProviderName::OpenAICompatible => write!(f, "openai-compatible"),
            ProviderName::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl std::str::FromStr for ProviderName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderName::Gemini),
            "openai" => Ok(ProviderName::OpenAI),
            "openai-compatible" => Ok(ProviderName::OpenAICompatible),
            "anthropic" => Ok(ProviderName::Anthropic),
            other => Err(format!(
                "unsupported provider: '{other}'. Supported: gemini, openai, \
                 openai-compatible, anthropic"
            )),
        }
    }
}

impl ProviderName {
    /// Provider-specific environment variable holding the server's default key.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ProviderName::Gemini => "GOOGLE_GEMINI_API_KEY",
            ProviderName::OpenAI | ProviderName::OpenAICompatible => "OPENAI_API_KEY",
            ProviderName::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Model used when neither the request nor the config names one.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderName::Gemini => "gemini-1.5-flash-latest",
            ProviderName::OpenAI | ProviderName::OpenAICompatible => "gpt-4o-mini",
            ProviderName::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    /// Models offered to clients for this provider, default first.
    pub fn catalog(self) -> &'static [ModelInfo] {
        match self {
            ProviderName::Gemini => GEMINI_MODELS,
            ProviderName::OpenAI | ProviderName::OpenAICompatible => OPENAI_MODELS,
            ProviderName::Anthropic => ANTHROPIC_MODELS,
        }
    }
}

/// A selectable model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
}

const GEMINI_MODELS: &[ModelInfo] = &[
    ModelInfo { id: "gemini-1.5-flash-latest", name: "Gemini 1.5 Flash" },
    ModelInfo { id: "gemini-1.5-pro-latest", name: "Gemini 1.5 Pro" },
    ModelInfo { id: "gemini-pro", name: "Gemini Pro (Legacy)" },
];

const OPENAI_MODELS: &[ModelInfo] = &[
    ModelInfo { id: "gpt-4o-mini", name: "GPT-4o mini" },
    ModelInfo { id: "gpt-4o", name: "GPT-4o" },
];

const ANTHROPIC_MODELS: &[ModelInfo] = &[
    ModelInfo { id: "claude-sonnet-4-20250514", name: "Claude Sonnet 4" },
    ModelInfo { id: "claude-3-5-haiku-latest", name: "Claude 3.5 Haiku" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_name_roundtrips_through_display() {
        for name in [
            ProviderName::Gemini,
            ProviderName::OpenAI,
            ProviderName::OpenAICompatible,
            ProviderName::Anthropic,
        ] {
            assert_eq!(name.to_string().parse::<ProviderName>().unwrap(), name);
        }
    }

    #[test]
    fn provider_name_from_str_case_insensitive() {
        assert_eq!("GEMINI".parse::<ProviderName>().unwrap(), ProviderName::Gemini);
        assert_eq!("Google".parse::<ProviderName>().unwrap(), ProviderName::Gemini);
        assert_eq!("OpenAI".parse::<ProviderName>().unwrap(), ProviderName::OpenAI);
    }

    #[test]
    fn provider_name_from_str_invalid() {
        let err = "cohere".parse::<ProviderName>().unwrap_err();
        assert!(err.contains("unsupported provider"));
        assert!(err.contains("cohere"));
    }

    #[test]
    fn provider_name_default_is_gemini() {
        assert_eq!(ProviderName::default(), ProviderName::Gemini);
        assert_eq!(
            ProviderName::Gemini.api_key_env_var(),
            "GOOGLE_GEMINI_API_KEY"
        );
    }

    #[test]
    fn provider_name_serde_uses_kebab_names() {
        let json = serde_json::to_string(&ProviderName::OpenAICompatible).unwrap();
        assert_eq!(json, "\"openai-compatible\"");
        let back: ProviderName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ProviderName::OpenAICompatible);
    }

    #[test]
    fn catalog_starts_with_default_model() {
        for name in [ProviderName::Gemini, ProviderName::OpenAI, ProviderName::Anthropic] {
            assert_eq!(name.catalog()[0].id, name.default_model());
        }
    }

    #[test]
    fn role_parses_and_serializes_lowercase() {
        assert_eq!("Assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!(Role::User.to_string(), "user");
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(msg, ChatMessage::assistant("hi"));
    }

    #[test]
    fn has_text_ignores_whitespace() {
        assert!(!ChatMessage::user("  \n").has_text());
        assert!(ChatMessage::user("review this").has_text());
    }
}
