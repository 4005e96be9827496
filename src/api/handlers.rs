use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::chat_manager::intent::{extract_intent, is_service_request, DEFAULT_COUNT};
use crate::chat_manager::resolver::resolve_providers;
use crate::chat_manager::service::ModelInvoker;
use crate::chat_manager::types::{ProviderRecord, RequestContext};
use crate::models::UsageReport;

fn default_count() -> usize {
    DEFAULT_COUNT
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub service: String,
    pub location: String,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub existing: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub providers: Vec<ProviderRecord>,
    pub usage_report: UsageReport,
}

#[derive(Debug, Deserialize)]
pub struct NlpRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct NlpResponse {
    pub valid: bool,
    pub providers: Vec<ProviderRecord>,
    pub usage_report: Option<UsageReport>,
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "ServiceGPT API is running",
    }))
}

pub async fn chat<I>(
    State(state): State<AppState<I>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError>
where
    I: ModelInvoker + Send + Sync + 'static,
{
    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id, service = %req.service, location = %req.location);

    async move {
        let count = req.count.clamp(1, state.config.max_count);
        let ctx = RequestContext::new(req.service, req.location, count).with_existing(req.existing);
        let resolution = resolve_providers(state.invoker.as_ref(), &state.config, &ctx).await?;
        info!(
            providers = resolution.providers.len(),
            top_ups = resolution.top_up_attempts,
            cost_usd = resolution.usage_report.estimated_cost_usd,
            "chat request resolved"
        );

        formatted(&ChatResponse {
            providers: resolution.providers,
            usage_report: resolution.usage_report,
        })
    }
    .instrument(span)
    .await
}

pub async fn nlp<I>(
    State(state): State<AppState<I>>,
    Json(req): Json<NlpRequest>,
) -> Result<Json<Value>, ApiError>
where
    I: ModelInvoker + Send + Sync + 'static,
{
    let request_id = Uuid::new_v4();
    let span = info_span!("nlp", %request_id);

    async move {
        let invoker = state.invoker.as_ref();
        if !is_service_request(invoker, &state.config, &req.query).await? {
            info!("query is not a service request");
            return formatted(&NlpResponse {
                valid: false,
                providers: Vec::new(),
                usage_report: None,
            });
        }

        let ctx = extract_intent(invoker, &state.config, &req.query).await?;
        let resolution = resolve_providers(invoker, &state.config, &ctx).await?;
        info!(
            providers = resolution.providers.len(),
            top_ups = resolution.top_up_attempts,
            "nlp request resolved"
        );

        formatted(&NlpResponse {
            valid: true,
            providers: resolution.providers,
            usage_report: Some(resolution.usage_report),
        })
    }
    .instrument(span)
    .await
}

fn formatted<T: Serialize>(body: &T) -> Result<Json<Value>, ApiError> {
    serde_json::to_value(body)
        .map(Json)
        .map_err(|err| ApiError::formatting(&err))
}
