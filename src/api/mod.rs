use std::sync::Arc;

use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, warn};

use crate::chat_manager::service::ModelInvoker;
use crate::config::AppConfig;
use crate::error::AppError;

mod handlers;

pub use handlers::{ChatRequest, ChatResponse, NlpRequest, NlpResponse};

/// Shared per-process state handed to every handler.
pub struct AppState<I> {
    pub config: Arc<AppConfig>,
    pub invoker: Arc<I>,
}

impl<I> AppState<I> {
    pub fn new(config: AppConfig, invoker: I) -> Self {
        Self {
            config: Arc::new(config),
            invoker: Arc::new(invoker),
        }
    }
}

impl<I> Clone for AppState<I> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            invoker: Arc::clone(&self.invoker),
        }
    }
}

/// Every failure reaches the client as a 500 with a short `detail`.
#[derive(Debug)]
pub struct ApiError {
    detail: String,
}

impl ApiError {
    fn formatting(err: &serde_json::Error) -> Self {
        error!(error = %err, "response did not serialize");
        Self {
            detail: "result formatting failure".into(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        error!(error = %err, "request failed");
        Self {
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

pub fn router<I>(state: AppState<I>) -> Router
where
    I: ModelInvoker + Send + Sync + 'static,
{
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat::<I>))
        .route("/api/nlp", post(handlers::nlp::<I>))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
