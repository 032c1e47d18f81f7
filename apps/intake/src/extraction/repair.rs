use serde_json::Value;

/// Parses one candidate span, allowing a single trailing comma before the
/// final closing brace or bracket. Parse failures become `None`.
pub fn parse_candidate(raw: &str) -> Option<Value> {
    let candidate = raw.trim_matches(|c: char| c == '`' || c.is_whitespace());
    if candidate.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str(candidate) {
        return Some(value);
    }

    let repaired = strip_trailing_comma(candidate)?;
    serde_json::from_str(&repaired).ok()
}

/// `{"a": 1,}` -> `{"a": 1}`. Only the comma directly before the last closer is touched.
fn strip_trailing_comma(candidate: &str) -> Option<String> {
    let closer = candidate.chars().last().filter(|c| matches!(c, '}' | ']'))?;
    let body = candidate[..candidate.len() - closer.len_utf8()].trim_end();
    let body = body.strip_suffix(',')?;
    Some(format!("{body}{closer}"))
}
