use std::collections::HashMap;

use serde_json::Value;

use super::types::RawResponse;
use crate::config::{AppConfig, Backend};

pub trait ProviderAdapter {
    /// Short name used in logs.
    fn label(&self) -> &'static str;

    /// Complete request URL. The secondary URL already names its model.
    fn build_url(&self) -> String;

    /// Headers for every call, including the credential.
    fn headers(&self) -> HashMap<String, String>;

    fn body(&self, model_name: &str, prompt: &str, use_search: bool) -> Value;

    /// Tag a decoded response body with this backend's shape.
    fn wrap(&self, data: Value) -> RawResponse;
}

mod google_gemini;
mod openai;

pub use google_gemini::{corrected_url, GoogleGeminiAdapter};
pub use openai::OpenAIResponsesAdapter;

pub fn adapter_for(config: &AppConfig) -> Box<dyn ProviderAdapter + Send + Sync> {
    match (&config.backend, &config.secondary) {
        (Backend::Secondary, Some(secondary)) => Box::new(GoogleGeminiAdapter::new(secondary)),
        _ => Box::new(OpenAIResponsesAdapter::new(&config.primary)),
    }
}

/// Bodies that were not JSON become `Text`; anything else is handed back.
fn wrap_text_body(data: Value) -> Result<RawResponse, Value> {
    match data {
        Value::String(text) => Ok(RawResponse::Text(text)),
        Value::Null => Ok(RawResponse::Text(String::new())),
        other => Err(other),
    }
}
