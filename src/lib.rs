pub mod api;
pub mod chat_manager;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod serde_utils;
pub mod transport;

use tokio::net::TcpListener;
use tracing::info;

use crate::api::{router, AppState};
use crate::chat_manager::{HttpModelInvoker, RequestContext, Resolution};
use crate::config::AppConfig;
use crate::error::AppError;

/// Serves the HTTP API until the process is stopped.
pub async fn serve(config: AppConfig) -> Result<(), AppError> {
    let bind = config.bind;
    let invoker = HttpModelInvoker::new(&config)?;
    info!(
        %bind,
        backend = ?config.backend,
        model = %config.model_name(),
        "starting ServiceGPT API"
    );

    let app = router(AppState::new(config, invoker));
    let listener = TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Runs one lookup against the configured backend without the HTTP layer.
pub async fn lookup(config: &AppConfig, ctx: &RequestContext) -> Result<Resolution, AppError> {
    let invoker = HttpModelInvoker::new(config)?;
    chat_manager::resolve_providers(&invoker, config, ctx).await
}
