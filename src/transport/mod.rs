use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::serde_utils::{parse_body_to_value, sanitize_header_value, summarize_json, truncate_for_log};

pub fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client, AppError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(AppError::from)
}

fn header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(header_value)) => {
                map.insert(name, header_value);
            }
            _ => warn!(
                header = %key,
                value = %sanitize_header_value(key, value),
                "skipping invalid header"
            ),
        }
    }
    map
}

/// POST a JSON body and decode the reply. Bodies that are not JSON come back
/// as `Value::String`; an empty body is `Value::Null`.
pub async fn post_json(
    client: &reqwest::Client,
    url: &str,
    headers: &HashMap<String, String>,
    body: &Value,
) -> Result<(StatusCode, Value), AppError> {
    let header_preview = headers
        .iter()
        .map(|(key, value)| format!("{}={}", key, sanitize_header_value(key, value)))
        .collect::<Vec<_>>()
        .join(", ");
    debug!(
        url,
        headers = %header_preview,
        body = %summarize_json(body),
        "sending request"
    );

    let response = client
        .post(url)
        .headers(header_map(headers))
        .json(body)
        .send()
        .await?;
    let status = response.status();
    let bytes = response.bytes().await?;
    let text = String::from_utf8_lossy(&bytes);

    debug!(
        url,
        status = status.as_u16(),
        bytes = bytes.len(),
        preview = %truncate_for_log(&text, 512),
        "response received"
    );

    Ok((status, parse_body_to_value(&text)))
}
