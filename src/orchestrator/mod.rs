//! Review orchestrator: request resolution, prompt construction, and
//! the provider call.
//!
//! A review runs as one provider call per request. [`ReviewOrchestrator::resolve`]
//! turns the wire request into a fully-resolved [`ResolvedReview`] (or the
//! reason it cannot run); [`ReviewOrchestrator::stream_review`] composes
//! the prompt, starts the provider stream and wraps it in a [`relay`].

pub mod relay;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::info;

use crate::config::Config;
use crate::intake::{self, IntakeRejection};
use crate::models::{ChatMessage, Role, SubmittedFile};
use crate::prompt;
use crate::providers::{ChatProvider, ChatRequest, ProviderError, REVIEW_SAMPLING};

pub use relay::{RelayEvent, RelayStream, relay};

/// Message returned when no usable input is present.
pub const NO_INPUT_MESSAGE: &str = "No input provided (message, files, or GitHub PR URL).";

/// Errors from the orchestrator.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("No API key available. Add your provider API key and try again.")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(#[from] IntakeRejection),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Review timed out after {0} seconds.")]
    Timeout(u64),
}

/// Body of `POST /api/review`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<SubmittedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_pr_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ReviewRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewRequest")
            .field("messages", &self.messages.len())
            .field("model", &self.model)
            .field("files", &self.files.len())
            .field("github_pr_url", &self.github_pr_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Everything one review call needs, resolved against server defaults.
#[derive(Clone)]
pub struct ResolvedReview {
    pub history: Vec<ChatMessage>,
    pub files: Vec<SubmittedFile>,
    pub pr_url: Option<String>,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for ResolvedReview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedReview")
            .field("history", &self.history.len())
            .field("files", &self.files.len())
            .field("pr_url", &self.pr_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Runs reviews against one provider.
pub struct ReviewOrchestrator {
    provider: Arc<dyn ChatProvider>,
    config: Config,
}

impl ReviewOrchestrator {
    pub fn new(provider: Arc<dyn ChatProvider>, config: &Config) -> Self {
        Self {
            provider,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate a request and fill in server defaults.
    ///
    /// Checks run in order: credential, then input presence, then the
    /// upload ceilings. Nothing here touches the provider.
    pub fn resolve(&self, request: ReviewRequest) -> Result<ResolvedReview, ReviewError> {
        let api_key = non_blank(request.api_key)
            .or_else(|| non_blank(self.config.provider.api_key.clone()))
            .ok_or(ReviewError::Unauthorized)?;

        let pr_url = non_blank(request.github_pr_url);
        let has_text = request
            .messages
            .iter()
            .any(|m| m.role == Role::User && m.has_text());
        if !has_text && request.files.is_empty() && pr_url.is_none() {
            return Err(ReviewError::BadRequest(NO_INPUT_MESSAGE.to_string()));
        }

        intake::validate_submitted(&request.files, &self.config.upload)?;

        let model = non_blank(request.model)
            .unwrap_or_else(|| self.config.provider.model().to_string());

        Ok(ResolvedReview {
            history: request.messages,
            files: request.files,
            pr_url,
            model,
            api_key,
        })
    }

    /// Start the provider stream for a resolved review.
    ///
    /// The request deadline covers both the initial call and the relay.
    pub async fn stream_review(&self, review: ResolvedReview) -> Result<RelayStream, ReviewError> {
        let timeout = self.config.server.request_timeout();
        // `request_timeout` is clamped, so this cannot overflow.
        let deadline = Instant::now() + timeout;

        let messages = prompt::compose(&review.history, &review.files, review.pr_url.as_deref());
        info!(
            provider = %self.provider.name(),
            model = %review.model,
            files = review.files.len(),
            pr = review.pr_url.is_some(),
            turns = review.history.len(),
            "starting review"
        );

        let request = ChatRequest {
            model: review.model,
            messages,
            sampling: REVIEW_SAMPLING,
            api_key: review.api_key,
        };
        let upstream = tokio::time::timeout_at(deadline, self.provider.stream_chat(request))
            .await
            .map_err(|_| ReviewError::Timeout(timeout.as_secs()))??;

        Ok(relay(upstream, deadline, timeout))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
