use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::{wrap_text_body, ProviderAdapter};
use crate::chat_manager::types::RawResponse;
use crate::config::SecondaryConfig;

/// Secondary backend: a `generateContent`-style JSON endpoint.
pub struct GoogleGeminiAdapter {
    api_key: String,
    api_key_header: String,
    api_url: String,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiChatRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

impl GoogleGeminiAdapter {
    pub fn new(config: &SecondaryConfig) -> Self {
        let api_url = corrected_url(&config.api_url, &config.model);
        if api_url != config.api_url {
            warn!(
                configured = %config.api_url,
                corrected = %api_url,
                model = %config.model,
                "secondary URL did not name the configured model; rewrote it"
            );
        }
        Self {
            api_key: config.api_key.clone(),
            api_key_header: config.api_key_header.clone(),
            api_url,
        }
    }
}

/// Rewrites the `/models/<name>` path segment to `model_name` when the URL
/// does not already mention the model. Any `:method` suffix is kept.
pub fn corrected_url(api_url: &str, model_name: &str) -> String {
    let model_name = model_name.trim();
    if model_name.is_empty() || api_url.contains(model_name) {
        return api_url.to_string();
    }
    let Ok(mut url) = Url::parse(api_url) else {
        return api_url.to_string();
    };
    let mut segments: Vec<String> = match url.path_segments() {
        Some(segments) => segments.map(|s| s.to_string()).collect(),
        None => return api_url.to_string(),
    };
    let Some(pos) = segments.iter().position(|s| s == "models") else {
        return api_url.to_string();
    };

    match segments.get_mut(pos + 1) {
        Some(target) => {
            let suffix = target
                .find(':')
                .map(|idx| target[idx..].to_string())
                .unwrap_or_default();
            *target = format!("{}{}", model_name, suffix);
        }
        None => segments.push(format!("{}:generateContent", model_name)),
    }
    url.set_path(&format!("/{}", segments.join("/")));
    url.to_string()
}

impl ProviderAdapter for GoogleGeminiAdapter {
    fn label(&self) -> &'static str {
        "secondary"
    }

    fn build_url(&self) -> String {
        self.api_url.clone()
    }

    fn headers(&self) -> HashMap<String, String> {
        let mut out: HashMap<String, String> = HashMap::new();
        out.insert(self.api_key_header.clone(), self.api_key.clone());
        out.insert("Content-Type".into(), "application/json".into());
        out.insert("User-Agent".into(), "ServiceGPT/1.0".into());
        out
    }

    fn body(&self, _model_name: &str, prompt: &str, use_search: bool) -> Value {
        if use_search {
            debug!("secondary backend has no search augmentation; sending plain prompt");
        }
        let body = GeminiChatRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
        };
        serde_json::to_value(body).unwrap_or_else(|_| json!({}))
    }

    fn wrap(&self, data: Value) -> RawResponse {
        wrap_text_body(data).unwrap_or_else(RawResponse::Secondary)
    }
}
