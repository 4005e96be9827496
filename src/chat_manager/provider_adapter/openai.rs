use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Value};

use super::{wrap_text_body, ProviderAdapter};
use crate::chat_manager::types::RawResponse;
use crate::config::PrimaryConfig;

/// OpenAI Responses API (`POST /responses`).
pub struct OpenAIResponsesAdapter {
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct ResponsesTool {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ResponsesTool>>,
}

impl OpenAIResponsesAdapter {
    pub fn new(config: &PrimaryConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        }
    }
}

impl ProviderAdapter for OpenAIResponsesAdapter {
    fn label(&self) -> &'static str {
        "primary"
    }

    fn build_url(&self) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        if trimmed.ends_with("/v1") {
            format!("{}/responses", trimmed)
        } else {
            format!("{}/v1/responses", trimmed)
        }
    }

    fn headers(&self) -> HashMap<String, String> {
        let mut out: HashMap<String, String> = HashMap::new();
        out.insert("Authorization".into(), format!("Bearer {}", self.api_key));
        out.insert("Content-Type".into(), "application/json".into());
        out.insert("Accept".into(), "application/json".into());
        out.insert("User-Agent".into(), "ServiceGPT/1.0".into());
        out
    }

    fn body(&self, model_name: &str, prompt: &str, use_search: bool) -> Value {
        let request = ResponsesRequest {
            model: model_name,
            input: prompt,
            tools: use_search.then(|| vec![ResponsesTool { kind: "web_search" }]),
        };
        serde_json::to_value(request).unwrap_or_else(|_| json!({}))
    }

    fn wrap(&self, data: Value) -> RawResponse {
        wrap_text_body(data).unwrap_or_else(RawResponse::Primary)
    }
}
