use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LocationNote {
    #[default]
    Exact,
    Nearby,
    Error,
}

impl LocationNote {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "EXACT" => Some(Self::Exact),
            "NEARBY" => Some(Self::Nearby),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    #[default]
    Low,
}

impl Confidence {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => Some(Self::High),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub name: String,
    pub phone: String,
    pub details: String,
    pub address: String,
    pub location_note: LocationNote,
    pub confidence: Confidence,
}

impl ProviderRecord {
    /// Placeholder returned when the model output could not be parsed.
    pub fn parse_error(raw_text: &str) -> Self {
        Self {
            name: "Error".into(),
            phone: "N/A".into(),
            details: raw_text.to_string(),
            address: "N/A".into(),
            location_note: LocationNote::Error,
            confidence: Confidence::Low,
        }
    }

    pub fn dedup_key(&self) -> String {
        normalize_name(&self.name)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Token counts for one model call. Missing counts are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageSummary {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Total reported by the backend, when it reports one.
    pub total_tokens: Option<u64>,
}

impl UsageSummary {
    pub fn total(&self) -> u64 {
        self.total_tokens
            .unwrap_or(self.input_tokens.saturating_add(self.output_tokens))
    }
}

/// One lookup as requested by a client.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub service: String,
    pub location: String,
    pub count: usize,
    pub existing: Vec<String>,
}

impl RequestContext {
    pub fn new(service: impl Into<String>, location: impl Into<String>, count: usize) -> Self {
        Self {
            service: service.into(),
            location: location.into(),
            count: count.max(1),
            existing: Vec::new(),
        }
    }

    pub fn with_existing(mut self, existing: Vec<String>) -> Self {
        self.existing = existing;
        self
    }
}

/// Names already accepted or supplied by the client, normalized.
#[derive(Debug, Default)]
pub struct SeenSet {
    names: HashSet<String>,
}

impl SeenSet {
    pub fn seeded<'a>(names: impl IntoIterator<Item = &'a String>) -> Self {
        let names = names
            .into_iter()
            .map(|n| normalize_name(n))
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    /// Marks the record as seen. Returns false for empty or already seen names.
    pub fn admit(&mut self, record: &ProviderRecord) -> bool {
        let key = record.dedup_key();
        if key.is_empty() {
            return false;
        }
        self.names.insert(key)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Response from a model backend, tagged by which backend produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Primary(Value),
    Secondary(Value),
    /// Body that was not JSON.
    Text(String),
}
