use serde::{Deserialize, Serialize};

/// Pricing information for a model, in USD per 1k tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// Price per 1k input tokens
    pub prompt: f64,
    /// Price per 1k output tokens
    pub completion: f64,
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self {
            prompt: 0.005,
            completion: 0.015,
        }
    }
}

/// Cost calculation result for a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestCost {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    /// Cost for prompt tokens
    pub prompt_cost: f64,
    /// Cost for completion tokens
    pub completion_cost: f64,
    /// Total cost in USD, rounded to 6 places
    pub total_cost: f64,
}

/// Token usage and estimated cost reported back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub estimated_cost_usd: f64,
}
