use serde_json::{Map, Value};

use super::types::{RawResponse, UsageSummary};
use crate::serde_utils::json_value_to_string;

/// Generated text of a response. Never fails; unusable input yields "".
pub fn extract_text(raw: &RawResponse) -> String {
    match raw {
        RawResponse::Primary(value) => primary_text(value),
        RawResponse::Secondary(value) => secondary_text(value),
        RawResponse::Text(text) => text.clone(),
    }
}

/// Token usage of a response. Missing counts are zero.
pub fn extract_usage(raw: &RawResponse) -> UsageSummary {
    match raw {
        RawResponse::Primary(value) | RawResponse::Secondary(value) => {
            let mut usage = usage_from_value(value).unwrap_or_default();
            usage.model = model_from_value(value).unwrap_or_default();
            usage
        }
        RawResponse::Text(_) => UsageSummary::default(),
    }
}

// Responses API: `output_text`, else message items under `output[].content[]`.
fn primary_text(value: &Value) -> String {
    if let Some(text) = value.get("output_text").and_then(|t| t.as_str()) {
        if !text.trim().is_empty() {
            return text.to_string();
        }
    }
    if let Some(Value::Array(items)) = value.get("output") {
        let mut combined = String::new();
        for item in items {
            if let Some(text) = item.get("content").and_then(join_text_fragments) {
                combined.push_str(&text);
            }
        }
        if !combined.trim().is_empty() {
            return combined;
        }
    }
    extract_text_from_value(value).unwrap_or_else(|| string_form(value))
}

// Gemini-style `candidates[].content.parts[]`, then the chat shapes.
fn secondary_text(value: &Value) -> String {
    if let Some(Value::Array(candidates)) = value.get("candidates") {
        let mut combined = String::new();
        for candidate in candidates {
            if let Some(parts) = candidate
                .get("content")
                .and_then(|c| c.get("parts"))
                .and_then(|p| p.as_array())
            {
                for part in parts {
                    if part.get("thought").and_then(|t| t.as_bool()) == Some(true) {
                        continue;
                    }
                    if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                        combined.push_str(text);
                    }
                }
            }
            if !combined.is_empty() {
                break;
            }
        }
        if !combined.trim().is_empty() {
            return combined;
        }
    }
    extract_text_from_value(value).unwrap_or_else(|| string_form(value))
}

fn string_form(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn extract_text_from_value(data: &Value) -> Option<String> {
    match data {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let mut combined = String::new();
            for item in items {
                if let Some(part) = extract_text_from_value(item) {
                    combined.push_str(&part);
                }
            }
            if combined.is_empty() {
                None
            } else {
                Some(combined)
            }
        }
        Value::Object(map) => {
            if let Some(Value::Array(choices)) = map.get("choices") {
                for choice in choices {
                    if let Value::Object(choice_map) = choice {
                        for key in ["message", "delta", "content"] {
                            if let Some(text) = choice_map.get(key).and_then(extract_message_content)
                            {
                                if !text.trim().is_empty() {
                                    return Some(text);
                                }
                            }
                        }
                    }
                }
            }
            if let Some(Value::Array(candidates)) = map.get("candidates") {
                for candidate in candidates {
                    if let Some(text) = extract_message_content(candidate) {
                        if !text.trim().is_empty() {
                            return Some(text);
                        }
                    }
                }
            }
            if let Some(text) = map.get("message").and_then(extract_message_content) {
                if !text.trim().is_empty() {
                    return Some(text);
                }
            }
            for key in ["content", "text", "parts"] {
                if let Some(text) = map.get(key).and_then(join_text_fragments) {
                    if !text.trim().is_empty() {
                        return Some(text);
                    }
                }
            }
            None
        }
        _ => None,
    }
}

fn extract_message_content(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            if let Some(content) = map.get("content") {
                if let Some(text) = join_text_fragments(content) {
                    return Some(text);
                }
            }
            if let Some(text) = map.get("text") {
                if let Some(text) = join_text_fragments(text) {
                    return Some(text);
                }
            }
            join_text_fragments(value)
        }
        _ => join_text_fragments(value),
    }
}

fn join_text_fragments(value: &Value) -> Option<String> {
    let mut buffer = String::new();
    collect_text_fragments(value, &mut buffer);
    if buffer.trim().is_empty() {
        None
    } else {
        Some(buffer)
    }
}

fn collect_text_fragments(value: &Value, acc: &mut String) {
    match value {
        Value::String(s) => acc.push_str(s),
        Value::Array(items) => {
            for item in items {
                collect_text_fragments(item, acc);
            }
        }
        Value::Object(map) => {
            let mut handled = false;
            for key in ["text", "content", "value", "message", "parts"] {
                if let Some(inner) = map.get(key) {
                    handled = true;
                    collect_text_fragments(inner, acc);
                }
            }
            if !handled {
                for inner in map.values() {
                    collect_text_fragments(inner, acc);
                }
            }
        }
        _ => {}
    }
}

fn model_from_value(value: &Value) -> Option<String> {
    ["model", "modelVersion"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|m| m.as_str()))
        .map(|m| m.to_string())
}

pub fn usage_from_value(data: &Value) -> Option<UsageSummary> {
    match data {
        Value::Array(items) => items.iter().find_map(usage_from_value),
        Value::Object(map) => {
            for container in ["usage", "usageMetadata"] {
                if let Some(Value::Object(obj)) = map.get(container) {
                    if let Some(summary) = usage_from_map(obj) {
                        return Some(summary);
                    }
                }
            }
            if let Some(summary) = usage_from_map(map) {
                return Some(summary);
            }
            map.values().find_map(usage_from_value)
        }
        _ => None,
    }
}

fn usage_from_map(map: &Map<String, Value>) -> Option<UsageSummary> {
    fn take_first(map: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
        for key in keys {
            if let Some(value) = map.get(*key) {
                if let Some(parsed) = parse_token_value(value) {
                    return Some(parsed);
                }
            }
        }
        None
    }

    let input_tokens = take_first(
        map,
        &[
            "input_tokens",
            "prompt_tokens",
            "inputTokens",
            "promptTokens",
            "promptTokenCount",
        ],
    );
    let output_tokens = take_first(
        map,
        &[
            "output_tokens",
            "completion_tokens",
            "outputTokens",
            "completionTokens",
            "candidatesTokenCount",
        ],
    );
    let total_tokens = take_first(map, &["total_tokens", "totalTokens", "totalTokenCount"]);

    if input_tokens.is_none() && output_tokens.is_none() && total_tokens.is_none() {
        None
    } else {
        Some(UsageSummary {
            model: String::new(),
            input_tokens: input_tokens.unwrap_or(0),
            output_tokens: output_tokens.unwrap_or(0),
            total_tokens,
        })
    }
}

fn parse_token_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(num) => num.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// An explicit `error` member in a backend JSON body, as (code, message).
pub fn extract_backend_error(data: &Value) -> Option<(String, String)> {
    let err = data.get("error")?;
    match err {
        Value::Object(map) => {
            let code = ["code", "status", "type"]
                .iter()
                .find_map(|key| map.get(*key).and_then(json_value_to_string))
                .unwrap_or_else(|| "unknown".to_string());
            let message = map
                .get("message")
                .and_then(json_value_to_string)
                .or_else(|| join_text_fragments(err))
                .unwrap_or_else(|| err.to_string());
            Some((code, message.trim().to_string()))
        }
        Value::String(message) if !message.trim().is_empty() => {
            Some(("unknown".to_string(), message.trim().to_string()))
        }
        _ => None,
    }
}

pub fn extract_error_message(data: &Value) -> Option<String> {
    match data {
        Value::Object(map) => {
            if let Some(err) = map.get("error") {
                if let Some(Value::String(message)) = err.get("message") {
                    let trimmed = message.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
                if let Some(text) = join_text_fragments(err) {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
            }
            if let Some(Value::String(message)) = map.get("message") {
                let trimmed = message.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        _ => {}
    }
    join_text_fragments(data)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
