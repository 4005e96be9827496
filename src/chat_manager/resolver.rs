use tracing::{debug, info, warn};

use super::parser::{parse_provider_list, parse_providers};
use super::prompts::{listing_prompt, top_up_prompt};
use super::request::{extract_text, extract_usage};
use super::service::ModelInvoker;
use super::types::{normalize_name, ProviderRecord, RequestContext, SeenSet};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{usage_report, UsageReport};
use crate::serde_utils::truncate_for_log;

/// Follow-up calls allowed after the initial listing call.
pub const MAX_TOP_UP_ATTEMPTS: usize = 2;

#[derive(Debug, Clone)]
pub struct Resolution {
    pub providers: Vec<ProviderRecord>,
    /// Usage of the initial listing call only.
    pub usage_report: UsageReport,
    pub top_up_attempts: usize,
}

/// Lists up to `ctx.count` providers not named in `ctx.existing`.
///
/// Only a failure of the initial call is returned as an error. A failing
/// top-up call ends the loop and whatever was accepted so far is returned.
pub async fn resolve_providers<I: ModelInvoker>(
    invoker: &I,
    config: &AppConfig,
    ctx: &RequestContext,
) -> Result<Resolution, AppError> {
    let model = config.model_name();
    let raw = invoker.invoke(model, &listing_prompt(ctx), true).await?;
    let text = extract_text(&raw);
    let usage = extract_usage(&raw);
    let usage_report = usage_report(&usage, model, &config.pricing);

    let Some(candidates) = parse_providers(&text) else {
        warn!(
            service = %ctx.service,
            preview = %truncate_for_log(&text, 200),
            "model reply held no provider JSON"
        );
        return Ok(Resolution {
            providers: vec![ProviderRecord::parse_error(&text)],
            usage_report,
            top_up_attempts: 0,
        });
    };

    let mut seen = SeenSet::seeded(&ctx.existing);
    let mut accepted: Vec<ProviderRecord> = Vec::with_capacity(ctx.count);
    admit_all(&mut seen, &mut accepted, candidates);
    info!(
        service = %ctx.service,
        location = %ctx.location,
        requested = ctx.count,
        accepted = accepted.len(),
        seen = seen.len(),
        "initial listing parsed"
    );

    let mut attempts = 0;
    while accepted.len() < ctx.count && attempts < MAX_TOP_UP_ATTEMPTS {
        attempts += 1;
        let missing = ctx.count - accepted.len();
        let known = known_names(&accepted, &ctx.existing);
        let prompt = top_up_prompt(ctx, &known, missing);

        let raw = match invoker.invoke(model, &prompt, true).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(attempt = attempts, error = %err, "top-up call failed; keeping partial results");
                break;
            }
        };

        let top_up_usage = extract_usage(&raw);
        debug!(
            attempt = attempts,
            input_tokens = top_up_usage.input_tokens,
            output_tokens = top_up_usage.output_tokens,
            "top-up usage (not included in the usage report)"
        );

        let before = accepted.len();
        match parse_provider_list(&extract_text(&raw)) {
            Some(records) => admit_all(&mut seen, &mut accepted, records),
            None => debug!(attempt = attempts, "top-up reply was not a JSON array"),
        }
        info!(
            attempt = attempts,
            missing,
            added = accepted.len() - before,
            "top-up attempt finished"
        );
    }

    accepted.truncate(ctx.count);
    Ok(Resolution {
        providers: accepted,
        usage_report,
        top_up_attempts: attempts,
    })
}

fn admit_all(seen: &mut SeenSet, accepted: &mut Vec<ProviderRecord>, records: Vec<ProviderRecord>) {
    for record in records {
        if seen.admit(&record) {
            accepted.push(record);
        } else {
            debug!(name = %record.name, "dropping unnamed or duplicate provider");
        }
    }
}

/// Accepted names followed by client-supplied ones, without repeats.
fn known_names(accepted: &[ProviderRecord], existing: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut keys = std::collections::HashSet::new();
    let candidates = accepted
        .iter()
        .map(|record| record.name.trim())
        .chain(existing.iter().map(|name| name.trim()));
    for name in candidates {
        if !name.is_empty() && keys.insert(normalize_name(name)) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::chat_manager::types::RawResponse;

    /// Invoker that replays queued replies and records each prompt.
    #[derive(Default)]
    pub struct ScriptedInvoker {
        replies: Mutex<VecDeque<Result<RawResponse, AppError>>>,
        pub prompts: Mutex<Vec<(String, bool)>>,
        calls: AtomicUsize,
    }

    impl ScriptedInvoker {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply_text(self, text: &str) -> Self {
            self.reply(Ok(primary_reply(text, 100, 50)))
        }

        pub fn reply(self, reply: Result<RawResponse, AppError>) -> Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn prompt(&self, idx: usize) -> String {
            self.prompts.lock().unwrap()[idx].0.clone()
        }
    }

    impl ModelInvoker for ScriptedInvoker {
        async fn invoke(
            &self,
            _model: &str,
            prompt: &str,
            use_search: bool,
        ) -> Result<RawResponse, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), use_search));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Other("no scripted reply left".into())))
        }
    }

    pub fn primary_reply(text: &str, input: u64, output: u64) -> RawResponse {
        RawResponse::Primary(json!({
            "model": "gpt-4o-2024-08-06",
            "output_text": text,
            "usage": {"input_tokens": input, "output_tokens": output}
        }))
    }

    pub fn records_json(names: &[&str]) -> String {
        let items: Vec<_> = names
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "phone": "555-0100",
                    "details": "licensed",
                    "address": "1 Main St",
                    "location_note": "EXACT",
                    "confidence": "HIGH"
                })
            })
            .collect();
        serde_json::Value::Array(items).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{primary_reply, records_json, ScriptedInvoker};
    use super::*;
    use crate::chat_manager::types::{Confidence, LocationNote};

    fn config() -> AppConfig {
        AppConfig::for_tests("http://unused.test/v1")
    }

    fn names(resolution: &Resolution) -> Vec<&str> {
        resolution.providers.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn existing_names_are_excluded_case_insensitively() {
        let invoker = ScriptedInvoker::new()
            .reply_text(&records_json(&["  john's PLUMBING ", "Pipe Masters"]));
        let ctx = RequestContext::new("plumber", "Austin", 1)
            .with_existing(vec!["John's Plumbing".into()]);

        let resolution = resolve_providers(&invoker, &config(), &ctx).await.unwrap();
        assert_eq!(names(&resolution), vec!["Pipe Masters"]);
        assert_eq!(invoker.calls(), 1);
    }

    #[tokio::test]
    async fn prose_reply_yields_a_single_error_record() {
        let prose = "Sorry, I could not find any plumbers there.";
        let invoker = ScriptedInvoker::new().reply_text(prose);
        let ctx = RequestContext::new("plumber", "Nowhere", 5);

        let resolution = resolve_providers(&invoker, &config(), &ctx).await.unwrap();
        assert_eq!(resolution.providers.len(), 1);
        let record = &resolution.providers[0];
        assert_eq!(record.location_note, LocationNote::Error);
        assert_eq!(record.confidence, Confidence::Low);
        assert_eq!(record.details, prose);
        assert_eq!(invoker.calls(), 1);
        assert_eq!(resolution.top_up_attempts, 0);
    }

    #[tokio::test]
    async fn short_listing_is_topped_up_at_most_twice() {
        let invoker = ScriptedInvoker::new()
            .reply_text(&records_json(&["A", "B"]))
            .reply_text(&records_json(&["a", "C"]))
            .reply_text("not json at all")
            .reply_text(&records_json(&["D", "E"]));
        let ctx = RequestContext::new("cleaner", "Denver", 5);

        let resolution = resolve_providers(&invoker, &config(), &ctx).await.unwrap();
        assert_eq!(invoker.calls(), 3);
        assert_eq!(resolution.top_up_attempts, MAX_TOP_UP_ATTEMPTS);
        assert_eq!(names(&resolution), vec!["A", "B", "C"]);

        let follow_up = invoker.prompt(1);
        assert!(follow_up.contains("- A\n- B"));
        assert!(follow_up.contains("Find exactly 3 more"));
        assert!(invoker.prompt(2).contains("- A\n- B\n- C"));
        assert!(invoker.prompts.lock().unwrap().iter().all(|(_, search)| *search));
    }

    #[tokio::test]
    async fn failing_top_up_keeps_partial_results() {
        let invoker = ScriptedInvoker::new()
            .reply_text(&records_json(&["A", "B"]))
            .reply(Err(AppError::Status {
                status: 503,
                message: "overloaded".into(),
            }))
            .reply_text(&records_json(&["C"]));
        let ctx = RequestContext::new("mechanic", "Reno", 4);

        let resolution = resolve_providers(&invoker, &config(), &ctx).await.unwrap();
        assert_eq!(names(&resolution), vec!["A", "B"]);
        assert_eq!(invoker.calls(), 2);
    }

    #[tokio::test]
    async fn initial_failure_is_propagated() {
        let invoker = ScriptedInvoker::new().reply(Err(AppError::Backend {
            code: "401".into(),
            message: "bad key".into(),
        }));
        let ctx = RequestContext::new("mechanic", "Reno", 4);

        let err = resolve_providers(&invoker, &config(), &ctx).await.unwrap_err();
        assert!(matches!(err, AppError::Backend { .. }));
    }

    #[tokio::test]
    async fn overshoot_is_truncated_and_unnamed_records_dropped() {
        let invoker = ScriptedInvoker::new()
            .reply_text(&records_json(&["", "A", "  ", "B", "C", "D"]));
        let ctx = RequestContext::new("barber", "Miami", 2);

        let resolution = resolve_providers(&invoker, &config(), &ctx).await.unwrap();
        assert_eq!(names(&resolution), vec!["A", "B"]);
        assert_eq!(invoker.calls(), 1);
    }

    #[tokio::test]
    async fn fenced_listing_and_usage_report_come_from_the_first_call() {
        let fenced = format!("Here you go:\n```json\n{}\n```", records_json(&["A"]));
        let invoker = ScriptedInvoker::new()
            .reply(Ok(primary_reply(&fenced, 1000, 1000)))
            .reply(Ok(primary_reply(&records_json(&["B"]), 9000, 9000)));
        let ctx = RequestContext::new("electrician", "Lahore", 2);

        let resolution = resolve_providers(&invoker, &config(), &ctx).await.unwrap();
        assert_eq!(names(&resolution), vec!["A", "B"]);
        assert_eq!(resolution.usage_report.input_tokens, 1000);
        assert_eq!(resolution.usage_report.total_tokens, 2000);
        assert_eq!(resolution.usage_report.estimated_cost_usd, 0.02);
        assert_eq!(resolution.usage_report.model, "gpt-4o-2024-08-06");
    }

    #[tokio::test]
    async fn oversized_usage_counts_do_not_fail_the_request() {
        let invoker = ScriptedInvoker::new()
            .reply(Ok(primary_reply(&records_json(&["A"]), u64::MAX, 1)));
        let ctx = RequestContext::new("plumber", "Austin", 1);

        let resolution = resolve_providers(&invoker, &config(), &ctx).await.unwrap();
        assert_eq!(names(&resolution), vec!["A"]);
        assert_eq!(resolution.usage_report.input_tokens, u64::MAX);
        assert_eq!(resolution.usage_report.total_tokens, u64::MAX);
    }

    #[test]
    fn known_names_merge_without_repeats() {
        let accepted = vec![ProviderRecord::parse_error("x")];
        let existing = vec!["error".to_string(), "Zed Co".to_string(), " ".to_string()];
        assert_eq!(known_names(&accepted, &existing), vec!["Error", "Zed Co"]);
    }
}
