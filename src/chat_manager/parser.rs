use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::types::{Confidence, LocationNote, ProviderRecord};
use crate::serde_utils::json_value_to_string;

const FENCE: &str = "```";

lazy_static! {
    static ref FENCE_TAG: Regex =
        Regex::new(r"^(?i:json)?[ \t]*\r?\n?").expect("fence tag pattern is valid");
}

/// JSON carried by model text: the whole text, or else the first fenced
/// block that parses.
pub fn parse_json_payload(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }
    // every fence may open a block, so a stray fence in prose cannot pair
    // with the opening fence of the real block
    trimmed
        .match_indices(FENCE)
        .find_map(|(start, _)| fenced_block_at(&trimmed[start + FENCE.len()..]))
}

fn fenced_block_at(after_fence: &str) -> Option<Value> {
    let tag_len = FENCE_TAG.find(after_fence).map_or(0, |m| m.end());
    let body = &after_fence[tag_len..];
    let end = body.find(FENCE)?;
    serde_json::from_str::<Value>(body[..end].trim()).ok()
}

/// Provider records in model text, or `None` when no JSON could be found.
///
/// Arrays yield their object elements. Objects yield their `providers`
/// array when present, otherwise themselves. Scalars yield nothing.
pub fn parse_providers(text: &str) -> Option<Vec<ProviderRecord>> {
    parse_json_payload(text).map(|value| providers_from_value(&value))
}

/// Like [`parse_providers`] but only accepts a top-level array.
pub fn parse_provider_list(text: &str) -> Option<Vec<ProviderRecord>> {
    match parse_json_payload(text)? {
        Value::Array(items) => Some(items.iter().filter_map(record_from_value).collect()),
        _ => None,
    }
}

pub fn providers_from_value(value: &Value) -> Vec<ProviderRecord> {
    match value {
        Value::Array(items) => items.iter().filter_map(record_from_value).collect(),
        Value::Object(map) => match map.get("providers") {
            Some(Value::Array(items)) => items.iter().filter_map(record_from_value).collect(),
            Some(_) => Vec::new(),
            None => record_from_value(value).into_iter().collect(),
        },
        _ => Vec::new(),
    }
}

fn record_from_value(value: &Value) -> Option<ProviderRecord> {
    let map = value.as_object()?;
    let field = |key: &str| {
        map.get(key)
            .and_then(json_value_to_string)
            .unwrap_or_default()
    };

    Some(ProviderRecord {
        name: field("name"),
        phone: field("phone"),
        details: field("details"),
        address: field("address"),
        location_note: LocationNote::from_str(&field("location_note")).unwrap_or_default(),
        confidence: Confidence::from_str(&field("confidence")).unwrap_or_default(),
    })
}
