//! Recovers the one structured JSON block an intake agent is told to emit
//! somewhere in its output.
//!
//! Strategies run in order of confidence and the first parseable candidate
//! wins:
//! 1. `OUTPUT_JSON_START { ... } OUTPUT_JSON_END` sentinels
//! 2. a ```` ```json ```` fenced block
//! 3. a brace span opening with the primary field (`"role"`)
//!
//! Only when none of those yields valid JSON does the balanced-delimiter
//! fallback scan every top-level `{...}` span, then every `[...]` span.
//! Nothing in here returns an error: a candidate that fails to parse is
//! simply skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

pub mod repair;
pub mod scan;

use repair::parse_candidate;
use scan::{balanced_spans, matching_closers};

pub const SENTINEL_START: &str = "OUTPUT_JSON_START";
pub const SENTINEL_END: &str = "OUTPUT_JSON_END";
/// Leading field of the intake payload, used to recognise unmarked objects.
pub const PRIMARY_FIELD: &str = "role";

static SENTINEL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?s){SENTINEL_START}\s*(\{{.*?\}})\s*{SENTINEL_END}")).unwrap()
});

static FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?i:json)\s*(\{.*?\})\s*```").unwrap());

static PRIMARY_FIELD_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r#"\{{\s*"{PRIMARY_FIELD}""#)).unwrap());

/// Bracket pairs tried by the fallback scan, in order.
const DELIMITER_FAMILIES: &[(u8, u8)] = &[(b'{', b'}'), (b'[', b']')];

struct Strategy {
    name: &'static str,
    candidates: fn(&str) -> Vec<&str>,
}

const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "sentinel",
        candidates: sentinel_candidates,
    },
    Strategy {
        name: "fenced",
        candidates: fenced_candidates,
    },
    Strategy {
        name: "primary_field",
        candidates: primary_field_candidates,
    },
];

/// Locates and parses the structured output in `text`.
/// Returns `None` when no candidate span holds valid JSON.
pub fn extract(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }

    for strategy in STRATEGIES {
        if let Some(value) = (strategy.candidates)(text)
            .into_iter()
            .find_map(parse_candidate)
        {
            debug!(strategy = strategy.name, "Structured output extracted");
            return Some(value);
        }
    }

    for &(open, close) in DELIMITER_FAMILIES {
        if let Some(value) = balanced_spans(text, open, close)
            .into_iter()
            .find_map(parse_candidate)
        {
            debug!(
                strategy = "balanced_scan",
                delimiter = %(open as char),
                "Structured output extracted"
            );
            return Some(value);
        }
    }

    None
}

fn capture_group<'t>(pattern: &Regex, text: &'t str) -> Vec<&'t str> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

fn sentinel_candidates(text: &str) -> Vec<&str> {
    capture_group(&SENTINEL_PATTERN, text)
}

fn fenced_candidates(text: &str) -> Vec<&str> {
    capture_group(&FENCE_PATTERN, text)
}

/// Brace spans opening with the primary field. Spans nested inside an
/// earlier candidate are left out, so the parse work stays linear too.
fn primary_field_candidates(text: &str) -> Vec<&str> {
    let closers = matching_closers(text, b'{', b'}');
    let mut covered_until = 0;
    PRIMARY_FIELD_OPEN
        .find_iter(text)
        .filter_map(|m| {
            if m.start() < covered_until {
                return None;
            }
            let end = *closers.get(&m.start())?;
            covered_until = end + 1;
            Some(&text[m.start()..=end])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scenario_sentinel_with_noise() {
        let text = r#"blah OUTPUT_JSON_START {"role":"Engineer"} OUTPUT_JSON_END blah"#;
        assert_eq!(extract(text), Some(json!({"role": "Engineer"})));
    }

    #[test]
    fn test_sentinel_with_nested_object_and_newlines() {
        let text = "Thanks! Here is the summary.\nOUTPUT_JSON_START\n{\n  \"role\": \"Data Engineer\",\n  \"location\": {\"city\": \"Berlin\", \"remote\": true}\n}\nOUTPUT_JSON_END\nTalk soon.";
        assert_eq!(
            extract(text),
            Some(json!({
                "role": "Data Engineer",
                "location": {"city": "Berlin", "remote": true}
            }))
        );
    }

    #[test]
    fn test_sentinel_preferred_over_fence() {
        let text = "```json\n{\"role\": \"fenced\"}\n```\nOUTPUT_JSON_START {\"role\": \"marked\"} OUTPUT_JSON_END";
        assert_eq!(extract(text), Some(json!({"role": "marked"})));
    }

    #[test]
    fn test_broken_sentinel_falls_through_to_fence() {
        let text = "OUTPUT_JSON_START {\"role\": oops} OUTPUT_JSON_END\n```json\n{\"role\": \"PM\"}\n```";
        assert_eq!(extract(text), Some(json!({"role": "PM"})));
    }

    #[test]
    fn test_fenced_block() {
        let text = "```json\n{\"role\":\"PM\",\"seniority\":\"Senior\"}\n```";
        assert_eq!(
            extract(text),
            Some(json!({"role": "PM", "seniority": "Senior"}))
        );
    }

    #[test]
    fn test_trailing_comma_repaired() {
        let text = "OUTPUT_JSON_START {\"role\": \"QA\", \"skills\": [\"rust\"],} OUTPUT_JSON_END";
        assert_eq!(extract(text), Some(json!({"role": "QA", "skills": ["rust"]})));
    }

    #[test]
    fn test_primary_field_heuristic_takes_matching_brace() {
        let text = "Summary: {\"role\": \"SRE\", \"team\": {\"size\": 4}}, that's all.";
        assert_eq!(
            extract(text),
            Some(json!({"role": "SRE", "team": {"size": 4}}))
        );
    }

    #[test]
    fn test_many_unclosed_primary_field_openers_stay_linear() {
        let text = "{\"role\"".repeat(100_000);
        let started = std::time::Instant::now();
        assert_eq!(extract(&text), None);
        assert!(
            started.elapsed() < std::time::Duration::from_secs(5),
            "took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn test_nested_primary_field_spans_only_outermost_tried() {
        let text = "{\"role\": \"outer\", \"prev\": {\"role\": \"inner\"}}";
        assert_eq!(
            primary_field_candidates(text),
            vec![text]
        );
    }

    #[test]
    fn test_no_json_returns_none() {
        assert_eq!(extract("Hello, how are you doing today?"), None);
        assert_eq!(extract(""), None);
        assert_eq!(extract("{ unclosed and ] stray"), None);
    }

    #[test]
    fn test_fallback_skips_invalid_span() {
        let text = "first {not: valid} then {\"seniority\": \"Mid\"} done";
        assert_eq!(extract(text), Some(json!({"seniority": "Mid"})));
    }

    #[test]
    fn test_fallback_tries_brackets_after_braces() {
        let text = "no objects here {oops} but a list [\"a\", \"b\",]";
        assert_eq!(extract(text), Some(json!(["a", "b"])));
    }

    #[test]
    fn test_duplicate_sentinel_spans_first_valid_wins() {
        let text = "OUTPUT_JSON_START {\"role\": } OUTPUT_JSON_END ... OUTPUT_JSON_START {\"role\": \"second\"} OUTPUT_JSON_END";
        assert_eq!(extract(text), Some(json!({"role": "second"})));
    }
}
