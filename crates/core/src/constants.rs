//! Constants used throughout the temporal core crate.
//!
//! Defaults for configuration and the fixed markers the normaliser looks for live here so the
//! surfaces (REST, CLI) and the pipeline agree on them.

/// Output language used when the caller does not name one.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Marker some reasoning models emit between their reasoning and the final answer.
pub const THINK_SENTINEL: &str = "</think>";

/// Delimiter used to open and close markdown code blocks.
pub const CODE_FENCE: &str = "```";

/// Error message attached to fallback payloads when decoding fails.
pub const JSON_PARSE_FAILED: &str = "JSON parsing failed";

/// Key under which fallback payloads carry the reply that failed to decode.
pub const RAW_OUTPUT_KEY: &str = "raw_output";

/// Keys of the morphology payload.
pub const WORD_KEY: &str = "word";
pub const ANALYSIS_KEY: &str = "analysis";

/// Key under which fallback payloads carry the failure message.
pub const ERROR_KEY: &str = "error";

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_LLM_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model for the extraction tasks (events, causation, entity relations).
pub const DEFAULT_REASONING_MODEL: &str = "o3-mini";

/// Default model for the lightweight tasks (part of speech, morphology).
pub const DEFAULT_LIGHT_MODEL: &str = "gpt-4o-mini";

/// Default per-invocation timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:5001";
