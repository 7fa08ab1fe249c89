//! Tolerant JSON decoding for health exports
//!
//! Exporters emit bare `NaN`, `Infinity` and `-Infinity`, which JSON does not
//! allow. Decoding falls through increasingly narrow repairs and finally a
//! fixed empty payload, so callers always get a well-shaped value.

use crate::Dataset;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

/// Bare tokens replaced by `null`. `-Infinity` must precede `Infinity`.
const NON_FINITE_TOKENS: &[&str] = &["-Infinity", "Infinity", "NaN"];

static KEYED_NON_FINITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("[^"]+":\s*)(?:NaN|-?Infinity)"#).expect("valid regex")
});

/// Decode `text`, repairing non-finite tokens. Never fails.
///
/// 1. strict parse
/// 2. replace every bare non-finite token outside string literals, parse
/// 3. replace only tokens directly after a `"key":`, parse
/// 4. [`default_payload`]
pub fn safe_parse_json(text: &str) -> Value {
    let mut bytes = text.as_bytes().to_vec();
    if let Ok(value) = simd_json::from_slice::<Value>(&mut bytes) {
        return value;
    }

    match serde_json::from_str(&replace_bare_tokens(text)) {
        Ok(value) => return value,
        Err(e) => tracing::warn!(error = %e, "payload still invalid after replacing bare tokens"),
    }

    // Tier 2 repairs a subset of what tier 1 does, so it only matters if the
    // string-literal scan above misreads the payload. Kept as the narrower
    // last attempt before giving up on the data.
    match serde_json::from_str(&replace_keyed_tokens(text)) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "payload still invalid after keyed repair, using empty dataset");
            default_payload()
        }
    }
}

/// Decode and normalize a raw payload in one step.
pub fn parse_dataset(text: &str) -> Dataset {
    Dataset::from_value(&safe_parse_json(text))
}

/// The well-shaped empty payload returned when nothing else decodes.
pub fn default_payload() -> Value {
    json!({
        "weights": [],
        "heartRates": [],
        "activities": [],
        "sleeps": [],
        "summary": {
            "weight": { "latest": 0 },
            "heart_rate": { "avg": 0, "min": 0, "max": 0 },
            "activity": { "avg_steps": 0, "total_steps": 0 },
            "sleep": { "avg_duration_hours": 0 }
        }
    })
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Replace bare `NaN` / `Infinity` / `-Infinity` with `null`, leaving string
/// literals untouched.
pub fn replace_bare_tokens(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    // Start of the pending run of bytes to copy verbatim.
    let mut copy_from = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if b == b'"' {
            in_string = true;
            i += 1;
            continue;
        }

        let preceded_by_word = i > 0 && is_word_byte(bytes[i - 1]);
        let token = (!preceded_by_word)
            .then(|| {
                NON_FINITE_TOKENS.iter().find(|token| {
                    let end = i + token.len();
                    bytes[i..].starts_with(token.as_bytes())
                        && !bytes.get(end).copied().is_some_and(is_word_byte)
                })
            })
            .flatten();

        match token {
            Some(token) => {
                out.push_str(&text[copy_from..i]);
                out.push_str("null");
                i += token.len();
                copy_from = i;
            }
            None => i += 1,
        }
    }

    out.push_str(&text[copy_from..]);
    out
}

/// Replace non-finite tokens only where they directly follow a `"key":`.
pub fn replace_keyed_tokens(text: &str) -> String {
    KEYED_NON_FINITE.replace_all(text, "${1}null").into_owned()
}
