//! Native HTTP streaming provider.
//!
//! One client for every supported backend. The provider name selects the
//! endpoint, auth headers, request body and event decoder.

use async_trait::async_trait;
use tracing::{debug, error};

use crate::config::ProviderConfig;
use crate::models::ProviderName;

use super::sse::{self, Decoder};
use super::{ChatProvider, ChatRequest, ProviderError, TextStream, anthropic, gemini, openai};

/// Streaming chat provider over plain HTTPS + Server-Sent Events.
#[derive(Debug, Clone)]
pub struct HttpChatProvider {
    name: ProviderName,
    base_url: String,
    http: reqwest::Client,
}

impl HttpChatProvider {
    /// Create a provider, optionally against a custom base URL.
    ///
    /// `openai-compatible` has no public default and requires one.
    pub fn new(name: ProviderName, base_url: Option<&str>) -> Result<Self, ProviderError> {
        let base_url = match (base_url.map(str::trim).filter(|u| !u.is_empty()), name) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, ProviderName::Gemini) => gemini::DEFAULT_BASE_URL.to_string(),
            (None, ProviderName::OpenAI) => openai::DEFAULT_BASE_URL.to_string(),
            (None, ProviderName::Anthropic) => anthropic::DEFAULT_BASE_URL.to_string(),
            (None, ProviderName::OpenAICompatible) => {
                return Err(ProviderError::NotConfigured(
                    "openai-compatible provider requires base_url (set REVU_BASE_URL or \
                     [provider] base_url)"
                        .to_string(),
                ));
            }
        };
        Ok(Self {
            name,
            base_url,
            http: reqwest::Client::new(),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Self::new(config.name, config.base_url.as_deref())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build(&self, request: &ChatRequest) -> (reqwest::RequestBuilder, Decoder) {
        match self.name {
            ProviderName::Gemini => (
                self.http
                    .post(gemini::endpoint(&self.base_url, &request.model))
                    .header("x-goog-api-key", &request.api_key)
                    .json(&gemini::build_body(request)),
                gemini::decode as Decoder,
            ),
            ProviderName::OpenAI | ProviderName::OpenAICompatible => (
                self.http
                    .post(openai::endpoint(&self.base_url))
                    .bearer_auth(&request.api_key)
                    .json(&openai::build_body(request)),
                openai::decode as Decoder,
            ),
            ProviderName::Anthropic => (
                self.http
                    .post(anthropic::endpoint(&self.base_url))
                    .header("x-api-key", &request.api_key)
                    .header("anthropic-version", anthropic::API_VERSION)
                    .json(&anthropic::build_body(request)),
                anthropic::decode as Decoder,
            ),
        }
    }
}

#[async_trait]
impl ChatProvider for HttpChatProvider {
    fn name(&self) -> ProviderName {
        self.name
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<TextStream, ProviderError> {
        let provider = self.name;
        let (builder, decode) = self.build(&request);

        debug!(%provider, model = %request.model, messages = request.messages.len(), "starting stream");
        let response = builder
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|source| ProviderError::Http { provider, source })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = super::error_message(&body);
            error!(%provider, status, %message, "provider rejected request");
            return Err(ProviderError::Api {
                provider,
                status,
                message,
            });
        }

        Ok(sse::text_stream(provider, response, decode))
    }
}
