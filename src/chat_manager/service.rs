use std::future::Future;

use tracing::{info, warn};

use super::provider_adapter::{adapter_for, ProviderAdapter};
use super::request::{extract_backend_error, extract_error_message};
use super::types::RawResponse;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::transport;

/// Sends one prompt to a model backend.
///
/// Implementations do not retry; callers decide whether a failure aborts
/// the request or only ends a follow-up loop.
pub trait ModelInvoker {
    fn invoke(
        &self,
        model: &str,
        prompt: &str,
        use_search: bool,
    ) -> impl Future<Output = Result<RawResponse, AppError>> + Send;
}

/// Invoker backed by the HTTP backend selected in [`AppConfig`].
pub struct HttpModelInvoker {
    client: reqwest::Client,
    adapter: Box<dyn ProviderAdapter + Send + Sync>,
}

impl HttpModelInvoker {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: transport::build_client(Some(config.timeout))?,
            adapter: adapter_for(config),
        })
    }
}

impl ModelInvoker for HttpModelInvoker {
    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
        use_search: bool,
    ) -> Result<RawResponse, AppError> {
        let backend = self.adapter.label();
        let url = self.adapter.build_url();
        let headers = self.adapter.headers();
        let body = self.adapter.body(model, prompt, use_search);

        info!(backend, model, use_search, prompt_chars = prompt.len(), "invoking model");
        let (status, data) = transport::post_json(&self.client, &url, &headers, &body).await?;

        if let Some((code, message)) = extract_backend_error(&data) {
            warn!(backend, status = status.as_u16(), %code, %message, "backend reported an error");
            return Err(AppError::Backend { code, message });
        }
        if !status.is_success() {
            let message = extract_error_message(&data)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!(backend, status = status.as_u16(), %message, "backend call failed");
            return Err(AppError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(self.adapter.wrap(data))
    }
}
