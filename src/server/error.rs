//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::orchestrator::ReviewError;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Review(ReviewError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::Review(ReviewError::BadRequest(_) | ReviewError::Validation(_))
            | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Review(ReviewError::Provider(_) | ReviewError::Timeout(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "review failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "review rejected");
        }
        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::IntakeRejection;
    use crate::models::ProviderName;
    use crate::providers::ProviderError;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (ApiError::from(ReviewError::Unauthorized), 401),
            (ApiError::from(ReviewError::BadRequest("x".to_string())), 400),
            (
                ApiError::from(ReviewError::Validation(IntakeRejection::Unsupported {
                    name: "a.exe".to_string(),
                })),
                400,
            ),
            (ApiError::InvalidBody("eof".to_string()), 400),
            (ApiError::from(ReviewError::Timeout(30)), 500),
            (
                ApiError::from(ReviewError::Provider(ProviderError::Api {
                    provider: ProviderName::Gemini,
                    status: 429,
                    message: "quota".to_string(),
                })),
                500,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err}");
        }
    }

    #[test]
    fn provider_message_is_preserved() {
        let err = ApiError::from(ReviewError::Provider(ProviderError::Api {
            provider: ProviderName::Gemini,
            status: 400,
            message: "API key not valid.".to_string(),
        }));
        assert!(err.to_string().contains("API key not valid."));
        assert!(err.to_string().contains("400"));
    }
}
