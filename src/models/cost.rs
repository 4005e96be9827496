use crate::chat_manager::types::UsageSummary;
use crate::models::{ModelPricing, RequestCost, UsageReport};

const COST_DECIMALS: i32 = 6;

pub fn round_cost(value: f64) -> f64 {
    let factor = 10f64.powi(COST_DECIMALS);
    (value * factor).round() / factor
}

pub fn calculate_request_cost(
    prompt_tokens: u64,
    completion_tokens: u64,
    pricing: &ModelPricing,
) -> RequestCost {
    let prompt_cost = (prompt_tokens as f64 / 1000.0) * pricing.prompt;
    let completion_cost = (completion_tokens as f64 / 1000.0) * pricing.completion;

    RequestCost {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens.saturating_add(completion_tokens),
        prompt_cost,
        completion_cost,
        total_cost: round_cost(prompt_cost + completion_cost),
    }
}

/// Estimated USD cost at the default rate table.
pub fn estimate_cost(input_tokens: u64, output_tokens: u64) -> f64 {
    calculate_request_cost(input_tokens, output_tokens, &ModelPricing::default()).total_cost
}

pub fn usage_report(usage: &UsageSummary, fallback_model: &str, pricing: &ModelPricing) -> UsageReport {
    let cost = calculate_request_cost(usage.input_tokens, usage.output_tokens, pricing);
    let model = if usage.model.trim().is_empty() {
        fallback_model.to_string()
    } else {
        usage.model.clone()
    };

    UsageReport {
        model,
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        total_tokens: usage.total(),
        estimated_cost_usd: cost.total_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_request_cost() {
        let cost = calculate_request_cost(1000, 500, &ModelPricing::default());

        assert_eq!(cost.prompt_tokens, 1000);
        assert_eq!(cost.completion_tokens, 500);
        assert_eq!(cost.total_tokens, 1500);

        // 1000 tokens * 0.005/1k = 0.005
        assert!((cost.prompt_cost - 0.005).abs() < 1e-9);

        // 500 tokens * 0.015/1k = 0.0075
        assert!((cost.completion_cost - 0.0075).abs() < 1e-9);

        assert_eq!(cost.total_cost, 0.0125);
    }

    #[test]
    fn one_thousand_each_costs_two_cents() {
        assert_eq!(estimate_cost(1000, 1000), 0.02);
        assert_eq!(estimate_cost(0, 0), 0.0);
    }

    #[test]
    fn cost_is_rounded_to_six_places() {
        // 1 input token = 0.000005, 1 output token = 0.000015
        assert_eq!(estimate_cost(1, 1), 0.00002);
        // 333 * 0.000005 + 777 * 0.000015 = 0.001665 + 0.011655
        assert_eq!(estimate_cost(333, 777), 0.01332);
        assert_eq!(round_cost(0.123_456_789), 0.123457);
    }

    #[test]
    fn oversized_counts_saturate() {
        let cost = calculate_request_cost(u64::MAX, 1, &ModelPricing::default());
        assert_eq!(cost.total_tokens, u64::MAX);
        assert!(cost.total_cost.is_finite());

        let usage = UsageSummary {
            input_tokens: u64::MAX,
            output_tokens: 1,
            ..UsageSummary::default()
        };
        assert_eq!(usage_report(&usage, "gpt-4o", &ModelPricing::default()).total_tokens, u64::MAX);
    }

    #[test]
    fn report_prefers_backend_total_and_model() {
        let usage = UsageSummary {
            model: "gpt-4o-2024-08-06".into(),
            input_tokens: 1200,
            output_tokens: 300,
            total_tokens: Some(1600),
        };
        let report = usage_report(&usage, "gpt-4o", &ModelPricing::default());
        assert_eq!(report.model, "gpt-4o-2024-08-06");
        assert_eq!(report.total_tokens, 1600);
        assert_eq!(report.estimated_cost_usd, 0.0105);

        let report = usage_report(&UsageSummary::default(), "gpt-4o", &ModelPricing::default());
        assert_eq!(report.model, "gpt-4o");
        assert_eq!(report.total_tokens, 0);
    }
}
