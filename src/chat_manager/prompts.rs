use super::types::RequestContext;

const RECORD_FORMAT: &str = r#"[
  {
    "name": "...",
    "phone": "...",
    "details": "...",
    "address": "...",
    "location_note": "EXACT or NEARBY",
    "confidence": "HIGH or LOW"
  }
]"#;

/// Initial listing request.
pub fn listing_prompt(ctx: &RequestContext) -> String {
    format!(
        r#"Find the top {count} "{service}" specialists in "{location}".
If exact matches are not found, expand outward to the nearest areas and add a field "location_note": "NEARBY".
If information is sparse, still include it but mark with "confidence": "LOW".
Return ONLY valid JSON in this format:

{format}

No extra commentary, only JSON.
"#,
        count = ctx.count,
        service = ctx.service,
        location = ctx.location,
        format = RECORD_FORMAT,
    )
}

/// Follow-up request for `missing` more providers not among `known_names`.
pub fn top_up_prompt(ctx: &RequestContext, known_names: &[String], missing: usize) -> String {
    let known = if known_names.is_empty() {
        "(none)".to_string()
    } else {
        known_names
            .iter()
            .map(|name| format!("- {}", name))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"We already have these "{service}" providers in "{location}":
{known}

Find exactly {missing} more "{service}" specialists in or near "{location}" that are NEW and DISTINCT from every name listed above.
If real data is unavailable, you may include plausible entries marked with "confidence": "LOW".
Use "location_note": "NEARBY" for results outside "{location}".
Return ONLY a bare JSON array in this format, with no commentary and no code fences:

{format}
"#,
        service = ctx.service,
        location = ctx.location,
        known = known,
        missing = missing,
        format = RECORD_FORMAT,
    )
}

/// Yes/no gate deciding whether a free-text query asks for a local service.
pub fn intent_validation_prompt(query: &str) -> String {
    format!(
        r#"Analyze this query: "{query}"

Is this query asking for local service providers like electricians, plumbers, handymen, cleaners, mechanics, barbers, or similar home/personal services?

Return ONLY "VALID" or "INVALID" - nothing else.

Examples of VALID queries:
- "I need an electrician to fix my wiring"
- "Looking for a plumber in Chicago"
- "Find me a handyman near me"
- "I need a mechanic for car repair"
- "Looking for house cleaning services"
- "Need a barber for haircut"

Examples of INVALID queries:
- "What's the weather like?"
- "How to cook pasta?"
- "Tell me about artificial intelligence"
- "What's 2+2?"
- "Book a flight to New York"
"#,
        query = query,
    )
}

/// Pulls service, location and count out of a free-text request.
pub fn intent_extraction_prompt(query: &str, default_count: usize) -> String {
    format!(
        r#"From this service request: "{query}"

Extract the service type, location, and determine a reasonable number of providers (default {default_count}).

Return ONLY valid JSON in this format:

{{
  "service": "extracted service type",
  "location": "extracted location or 'not specified'",
  "count": {default_count}
}}

No extra commentary, only JSON.
"#,
        query = query,
        default_count = default_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_prompt_names_the_request() {
        let ctx = RequestContext::new("plumber", "Bahria Town Karachi", 4);
        let prompt = listing_prompt(&ctx);
        assert!(prompt.contains(r#"Find the top 4 "plumber" specialists in "Bahria Town Karachi"."#));
        assert!(prompt.contains(r#""location_note": "NEARBY""#));
        assert!(prompt.contains("No extra commentary, only JSON."));
    }

    #[test]
    fn top_up_prompt_lists_known_names_and_shortfall() {
        let ctx = RequestContext::new("electrician", "Lahore", 5);
        let known = vec!["Ali Electric".to_string(), "Power Fix".to_string()];
        let prompt = top_up_prompt(&ctx, &known, 3);
        assert!(prompt.contains("- Ali Electric\n- Power Fix"));
        assert!(prompt.contains("Find exactly 3 more"));
        assert!(prompt.contains("bare JSON array"));
        assert!(top_up_prompt(&ctx, &[], 1).contains("(none)"));
    }

    #[test]
    fn extraction_prompt_is_a_json_template() {
        let prompt = intent_extraction_prompt("need a barber in Austin", 3);
        assert!(prompt.contains(r#""count": 3"#));
        assert!(prompt.contains("need a barber in Austin"));
    }
}
