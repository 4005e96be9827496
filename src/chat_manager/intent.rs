use serde_json::Value;
use tracing::{info, warn};

use super::parser::parse_json_payload;
use super::prompts::{intent_extraction_prompt, intent_validation_prompt};
use super::request::extract_text;
use super::service::ModelInvoker;
use super::types::RequestContext;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::serde_utils::json_value_to_string;

pub const DEFAULT_COUNT: usize = 3;
pub const UNSPECIFIED_LOCATION: &str = "not specified";

/// True when the verdict says `VALID` and never `INVALID`.
///
/// `VALID` may follow a short preamble ("Answer: VALID"). Lowercase
/// `valid` only counts as the first word, so prose such as "not a valid
/// request" is not read as acceptance.
pub fn is_valid_verdict(text: &str) -> bool {
    let words: Vec<&str> = text
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
        .collect();
    if words.iter().any(|word| word.eq_ignore_ascii_case("invalid")) {
        return false;
    }
    words.first().is_some_and(|word| word.eq_ignore_ascii_case("valid"))
        || words.contains(&"VALID")
}

/// Asks the model whether `query` is a request for a local service.
pub async fn is_service_request<I: ModelInvoker>(
    invoker: &I,
    config: &AppConfig,
    query: &str,
) -> Result<bool, AppError> {
    let raw = invoker
        .invoke(config.model_name(), &intent_validation_prompt(query), false)
        .await?;
    let verdict = extract_text(&raw);
    let valid = is_valid_verdict(&verdict);
    info!(valid, verdict = %verdict.trim(), "intent gate answered");
    Ok(valid)
}

/// Turns a free-text query into a lookup request.
///
/// An unparseable extraction falls back to searching for the query itself
/// with no location and the default count.
pub async fn extract_intent<I: ModelInvoker>(
    invoker: &I,
    config: &AppConfig,
    query: &str,
) -> Result<RequestContext, AppError> {
    let raw = invoker
        .invoke(
            config.model_name(),
            &intent_extraction_prompt(query, DEFAULT_COUNT),
            false,
        )
        .await?;
    let text = extract_text(&raw);

    let ctx = match parse_json_payload(&text) {
        Some(Value::Object(map)) => {
            let field = |key: &str| {
                map.get(key)
                    .and_then(json_value_to_string)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            };
            let count = map
                .get("count")
                .and_then(count_from_value)
                .unwrap_or(DEFAULT_COUNT);
            RequestContext::new(
                field("service").unwrap_or_else(|| query.trim().to_string()),
                field("location").unwrap_or_else(|| UNSPECIFIED_LOCATION.to_string()),
                count.clamp(1, config.max_count),
            )
        }
        _ => {
            warn!(query, "could not extract intent; searching for the raw query");
            RequestContext::new(query.trim(), UNSPECIFIED_LOCATION, DEFAULT_COUNT.min(config.max_count))
        }
    };

    info!(
        service = %ctx.service,
        location = %ctx.location,
        count = ctx.count,
        "intent extracted"
    );
    Ok(ctx)
}

fn count_from_value(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
