//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the analysis service.
//! Request handling never reads process-wide environment variables, which keeps behaviour
//! consistent in multi-threaded runtimes and test harnesses.

use crate::constants::{
    DEFAULT_LIGHT_MODEL, DEFAULT_LLM_ENDPOINT, DEFAULT_REASONING_MODEL, DEFAULT_TIMEOUT_SECS,
};
use crate::task::ModelTier;
use crate::{AnalysisError, AnalysisResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone)]
pub struct CoreConfig {
    llm_endpoint: String,
    api_key: Option<String>,
    reasoning_model: String,
    light_model: String,
    timeout: Duration,
    transcript_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    /// Returns `AnalysisError::InvalidConfig` if the endpoint is not an http(s) URL, a model name
    /// is empty, or the timeout is zero.
    pub fn new(
        llm_endpoint: String,
        api_key: Option<String>,
        reasoning_model: String,
        light_model: String,
        timeout: Duration,
        transcript_dir: Option<PathBuf>,
    ) -> AnalysisResult<Self> {
        let llm_endpoint = llm_endpoint.trim().trim_end_matches('/').to_string();
        if !(llm_endpoint.starts_with("http://") || llm_endpoint.starts_with("https://")) {
            return Err(AnalysisError::InvalidConfig(format!(
                "LLM endpoint must be an http(s) URL, got {:?}",
                llm_endpoint
            )));
        }

        if reasoning_model.trim().is_empty() || light_model.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "model names cannot be empty".into(),
            ));
        }

        if timeout.is_zero() {
            return Err(AnalysisError::InvalidConfig(
                "completion timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            llm_endpoint,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            reasoning_model,
            light_model,
            timeout,
            transcript_dir,
        })
    }

    /// Build a configuration from optional raw values, applying defaults for anything missing.
    ///
    /// Values are passed in rather than read here so callers decide where they come from
    /// (process environment, CLI flags, tests).
    pub fn from_values(values: ConfigValues) -> AnalysisResult<Self> {
        let endpoint =
            non_empty(values.llm_endpoint).unwrap_or_else(|| DEFAULT_LLM_ENDPOINT.into());
        let api_key = non_empty(values.api_key).or_else(|| non_empty(values.fallback_api_key));
        let reasoning_model =
            non_empty(values.reasoning_model).unwrap_or_else(|| DEFAULT_REASONING_MODEL.into());
        let light_model =
            non_empty(values.light_model).unwrap_or_else(|| DEFAULT_LIGHT_MODEL.into());
        let timeout = timeout_from_env_value(values.timeout_secs)?;
        let transcript_dir = non_empty(values.transcript_dir).map(PathBuf::from);

        Self::new(
            endpoint,
            api_key,
            reasoning_model,
            light_model,
            timeout,
            transcript_dir,
        )
    }

    pub fn llm_endpoint(&self) -> &str {
        &self.llm_endpoint
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Model name configured for the given tier.
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Reasoning => &self.reasoning_model,
            ModelTier::Light => &self.light_model,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transcript_dir(&self) -> Option<&Path> {
        self.transcript_dir.as_deref()
    }
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("llm_endpoint", &self.llm_endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("reasoning_model", &self.reasoning_model)
            .field("light_model", &self.light_model)
            .field("timeout", &self.timeout)
            .field("transcript_dir", &self.transcript_dir)
            .finish()
    }
}

/// Raw, unvalidated configuration values, typically read from the environment.
///
/// Holds the credential unredacted, so it has no `Debug` impl.
#[derive(Clone, Default)]
pub struct ConfigValues {
    /// `LLM_ENDPOINT`
    pub llm_endpoint: Option<String>,
    /// `LLM_API_KEY`
    pub api_key: Option<String>,
    /// `OPENAI_API_KEY`, used only when `LLM_API_KEY` is absent
    pub fallback_api_key: Option<String>,
    /// `LLM_MODEL`
    pub reasoning_model: Option<String>,
    /// `LLM_LIGHT_MODEL`
    pub light_model: Option<String>,
    /// `LLM_TIMEOUT_SECS`
    pub timeout_secs: Option<String>,
    /// `TEMPORAL_TRANSCRIPT_DIR`
    pub transcript_dir: Option<String>,
}

impl ConfigValues {
    /// Snapshot the relevant process environment variables.
    pub fn from_env() -> Self {
        Self {
            llm_endpoint: std::env::var("LLM_ENDPOINT").ok(),
            api_key: std::env::var("LLM_API_KEY").ok(),
            fallback_api_key: std::env::var("OPENAI_API_KEY").ok(),
            reasoning_model: std::env::var("LLM_MODEL").ok(),
            light_model: std::env::var("LLM_LIGHT_MODEL").ok(),
            timeout_secs: std::env::var("LLM_TIMEOUT_SECS").ok(),
            transcript_dir: std::env::var("TEMPORAL_TRANSCRIPT_DIR").ok(),
        }
    }
}

/// Parse the completion timeout from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn timeout_from_env_value(value: Option<String>) -> AnalysisResult<Duration> {
    let Some(value) = non_empty(value) else {
        return Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    };

    let secs: u64 = value.parse().map_err(|_| {
        AnalysisError::InvalidConfig(format!(
            "LLM_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
            value
        ))
    })?;

    if secs == 0 {
        return Err(AnalysisError::InvalidConfig(
            "LLM_TIMEOUT_SECS must be greater than zero".into(),
        ));
    }

    Ok(Duration::from_secs(secs))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
