//! Response normalisation.
//!
//! Model replies are untrusted: they may be wrapped in markdown code fences, preceded by a
//! reasoning segment closed with `</think>`, or not be JSON at all. [`normalize`] turns any reply
//! into a [`NormalizedResult`] whose payload always has the task's canonical top-level keys.

use crate::constants::{
    ANALYSIS_KEY, CODE_FENCE, ERROR_KEY, JSON_PARSE_FAILED, RAW_OUTPUT_KEY, THINK_SENTINEL,
};
use crate::task::TaskKind;
use serde_json::{Map, Value};

/// Outcome of normalising one reply.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResult {
    /// The reply decoded to a JSON object (or, for free-text tasks, the cleaned text).
    Success(Value),
    /// The reply could not be decoded.
    Failure {
        /// The task's canonical empty value.
        fallback: Value,
        error: String,
        /// The cleaned reply that failed to decode.
        raw: String,
    },
}

impl NormalizedResult {
    pub fn is_success(&self) -> bool {
        matches!(self, NormalizedResult::Success(_))
    }

    /// The failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            NormalizedResult::Success(_) => None,
            NormalizedResult::Failure { error, .. } => Some(error),
        }
    }

    /// Render the result as the JSON object returned to callers.
    ///
    /// Successful objects keep every key the model produced; any canonical key it left out is
    /// filled from the canonical empty value. Free-text replies become the canonical object with
    /// the text under `analysis`. Failures become the canonical empty value plus `error` and
    /// `raw_output`.
    pub fn into_payload(self, task: TaskKind) -> Value {
        match self {
            NormalizedResult::Success(Value::Object(mut map)) => {
                if let Value::Object(defaults) = task.canonical_empty() {
                    for (key, value) in defaults {
                        map.entry(key).or_insert(value);
                    }
                }
                Value::Object(map)
            }
            // Free text lands in the task's text slot; the caller fills in the request fields.
            NormalizedResult::Success(Value::String(text))
                if !task.descriptor().expects_json =>
            {
                let mut payload = task.canonical_empty();
                if let Value::Object(map) = &mut payload {
                    map.insert(ANALYSIS_KEY.into(), Value::String(text));
                }
                payload
            }
            NormalizedResult::Success(other) => other,
            NormalizedResult::Failure {
                fallback,
                error,
                raw,
            } => {
                let mut map = match fallback {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                map.insert(ERROR_KEY.into(), Value::String(error));
                map.insert(RAW_OUTPUT_KEY.into(), Value::String(raw));
                Value::Object(map)
            }
        }
    }
}

/// Normalise a raw completion for `task`.
///
/// 1. Strip wrapping code fences.
/// 2. Keep only the text after the last `</think>`, if present.
/// 3. Trim whitespace.
/// 4. Decode strictly as JSON (skipped for free-text tasks).
///
/// A decode failure, or JSON whose top level is not an object, yields
/// [`NormalizedResult::Failure`] with the canonical empty value.
pub fn normalize(raw: &str, task: TaskKind) -> NormalizedResult {
    let cleaned = clean_reply(raw);

    if !task.descriptor().expects_json {
        return NormalizedResult::Success(Value::String(cleaned));
    }

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value @ Value::Object(_)) => NormalizedResult::Success(value),
        Ok(_) | Err(_) => {
            tracing::warn!(
                task = task.name(),
                raw_len = cleaned.len(),
                "model reply is not a JSON object, using fallback"
            );
            NormalizedResult::Failure {
                fallback: task.canonical_empty(),
                error: JSON_PARSE_FAILED.to_string(),
                raw: cleaned,
            }
        }
    }
}

/// Steps 1-3 of [`normalize`]: fence stripping, sentinel handling and trimming.
pub fn clean_reply(raw: &str) -> String {
    let unfenced = strip_code_fences(raw);
    let answer = after_last_sentinel(unfenced);
    strip_code_fences(answer).trim().to_string()
}

/// Remove a code fence wrapping the whole text. No-op if the text is not fenced.
///
/// An opening fence may carry a language tag (```` ```json ````); everything up to the end of
/// that line is dropped. A closing fence is only removed from the very end.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix(CODE_FENCE) {
        body = match rest.find('\n') {
            Some(newline) if is_fence_tag(&rest[..newline]) => &rest[newline + 1..],
            // Single-line fence: ```{"a": 1}``` or ```json {"a": 1}```
            _ => strip_inline_tag(rest),
        };
    }

    if let Some(rest) = body.trim_end().strip_suffix(CODE_FENCE) {
        body = rest;
    }

    body
}

/// Drop a language tag glued to a single-line fence body, but only when JSON follows it.
/// Prose such as ```` ```Verb, present tense.``` ```` is left intact.
fn strip_inline_tag(rest: &str) -> &str {
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    if tag_len == 0 {
        return rest;
    }
    let body = rest[tag_len..].trim_start();
    if body.starts_with('{') || body.starts_with('[') {
        body
    } else {
        rest
    }
}

fn is_fence_tag(tag: &str) -> bool {
    tag.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
}

/// Text after the last chain-of-thought sentinel, or the whole text if there is none.
pub fn after_last_sentinel(text: &str) -> &str {
    match text.rfind(THINK_SENTINEL) {
        Some(idx) => &text[idx + THINK_SENTINEL.len()..],
        None => text,
    }
}
