//! HTTP service: `POST /api/review` plus health and model listing.
//!
//! Review output is sent as Server-Sent Events:
//!
//! - `delta`: one text chunk, JSON-encoded as a string
//! - `error`: `{"message": ...}`, terminal
//! - `done`: empty, terminal
//!
//! Failures detected before the provider starts streaming are plain JSON
//! responses with status 400, 401 or 500.

pub mod error;

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Method, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::constants::{REVIEW_ENDPOINT, VERSION};
use crate::models::{ModelInfo, ProviderName};
use crate::orchestrator::{RelayEvent, ReviewOrchestrator, ReviewRequest};
use crate::providers::ChatProvider;

pub use error::{ApiError, ErrorBody};

/// JSON framing around the raw file bytes.
const BODY_LIMIT_SLACK: u64 = 1024 * 1024;

/// Shared handler state.
pub struct AppState {
    orchestrator: ReviewOrchestrator,
}

impl AppState {
    pub fn new(provider: Arc<dyn ChatProvider>, config: &Config) -> Self {
        Self {
            orchestrator: ReviewOrchestrator::new(provider, config),
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .orchestrator
        .config()
        .upload
        .max_total_bytes
        .saturating_add(BODY_LIMIT_SLACK);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(REVIEW_ENDPOINT, post(review))
        .route("/api/models", get(models))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(
            usize::try_from(body_limit).unwrap_or(usize::MAX),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /api/review`
async fn review(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    let resolved = state.orchestrator.resolve(request)?;
    let relay = state.orchestrator.stream_review(resolved).await?;

    let events = relay.map(|event| Ok::<_, Infallible>(to_sse(event)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_sse(event: RelayEvent) -> Event {
    match event {
        RelayEvent::Delta(text) => json_event("delta", &text),
        RelayEvent::Failed(message) => json_event("error", &ErrorBody { message }),
        RelayEvent::Done => Event::default().event("done").data(""),
    }
}

fn json_event(kind: &str, payload: &impl Serialize) -> Event {
    match Event::default().event(kind).json_data(payload) {
        Ok(event) => event,
        Err(e) => {
            error!(kind, error = %e, "failed to encode event");
            Event::default().event(kind)
        }
    }
}

/// `GET /health` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
    })
}

/// `GET /api/models` response.
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub provider: ProviderName,
    pub default_model: String,
    pub models: &'static [ModelInfo],
}

async fn models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    let provider = &state.orchestrator.config().provider;
    Json(ModelsResponse {
        provider: provider.name,
        default_model: provider.model().to_string(),
        models: provider.name.catalog(),
    })
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn serve<F>(
    config: &Config,
    provider: Arc<dyn ChatProvider>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(&config.server.listen).await?;
    serve_on(listener, Arc::new(AppState::new(provider, config)), shutdown).await
}

/// Serve on an already-bound listener.
pub async fn serve_on<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
