//! HTTP client for the review service.
//!
//! Posts a [`ReviewRequest`] and turns the server's event stream back into
//! [`ClientEvent`]s. A connection that ends without a terminal event is
//! reported as an interrupted stream; deltas received before that remain
//! valid.

pub mod request;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::REVIEW_ENDPOINT;
use crate::orchestrator::ReviewRequest;
use crate::server::ErrorBody;

pub use request::{ReviewDraft, build_request};

/// Errors from the review client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("could not reach review server: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Connection lost mid-response: {0}")]
    StreamInterrupted(String),

    #[error("nothing to review: add a message, a file or a pull request")]
    NothingToReview,
}

/// One decoded server event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Delta(String),
    Failed(String),
    Done,
}

pub type ClientStream = BoxStream<'static, ClientEvent>;

/// Model catalog served by `GET /api/models`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsListing {
    pub provider: String,
    pub default_model: String,
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ReviewClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReviewClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a review. Rejections (400/401/500) come back as
    /// [`ClientError::Server`] with the server's message.
    pub async fn stream_review(&self, request: &ReviewRequest) -> Result<ClientStream, ClientError> {
        let response = self
            .http
            .post(format!("{}{REVIEW_ENDPOINT}", self.base_url))
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or_else(|_| format!("HTTP {status}: {}", body.trim()));
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let mut events = Box::pin(response.bytes_stream().eventsource());
        Ok(Box::pin(async_stream::stream! {
            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        yield ClientEvent::Failed(ClientError::StreamInterrupted(e.to_string()).to_string());
                        return;
                    }
                };
                match event.event.as_str() {
                    "delta" => match serde_json::from_str::<String>(&event.data) {
                        Ok(text) => {
                            yield ClientEvent::Delta(text);
                        }
                        Err(e) => warn!(error = %e, "skipping undecodable delta"),
                    },
                    "error" => {
                        let message = serde_json::from_str::<ErrorBody>(&event.data)
                            .map(|b| b.message)
                            .unwrap_or(event.data);
                        yield ClientEvent::Failed(message);
                        return;
                    }
                    "done" => {
                        yield ClientEvent::Done;
                        return;
                    }
                    other => debug!(event = other, "ignoring unknown event"),
                }
            }
            yield ClientEvent::Failed(
                ClientError::StreamInterrupted("server closed the stream early".to_string()).to_string(),
            );
        }))
    }

    /// Fetch the server's model catalog.
    pub async fn models(&self) -> Result<ModelsListing, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/models", self.base_url))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: format!("HTTP {status}"),
            });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        assert_eq!(ReviewClient::new("http://x:3000/").base_url(), "http://x:3000");
    }

    #[test]
    fn server_error_displays_message_only() {
        let err = ClientError::Server {
            status: 401,
            message: "No API key".to_string(),
        };
        assert_eq!(err.to_string(), "No API key");
    }
}
