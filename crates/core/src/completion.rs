//! Completion backends and the invoker that calls them.
//!
//! [`CompletionBackend`] is the seam to the model provider: one prompt in, raw text out.
//! [`OpenAiBackend`] talks to any OpenAI-compatible `/chat/completions` endpoint. The
//! [`CompletionInvoker`] wraps a backend with the per-call timeout, empty-reply check and the
//! optional transcript hook. There are no retries: one call, one request.

use crate::config::CoreConfig;
use crate::task::{ModelTier, TaskKind};
use crate::transcript::TranscriptWriter;
use crate::{AnalysisError, AnalysisResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Raw text returned by a completion backend, before any normalisation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawCompletion(String);

impl RawCompletion {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A text-completion capability.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send one prompt and return the model's raw reply.
    ///
    /// # Errors
    /// Returns `BackendUnavailable` when no usable reply was obtained, or `BackendTimeout` when
    /// the transport gave up waiting.
    async fn complete(&self, prompt: &str, tier: ModelTier) -> AnalysisResult<RawCompletion>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Backend for OpenAI-compatible chat completion APIs.
pub struct OpenAiBackend {
    client: Client,
    url: String,
    api_key: Option<String>,
    reasoning_model: String,
    light_model: String,
    timeout: Duration,
}

impl OpenAiBackend {
    /// Create a backend from the resolved configuration.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the HTTP client cannot be constructed.
    pub fn new(cfg: &CoreConfig) -> AnalysisResult<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(|e| {
                AnalysisError::InvalidConfig(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            url: format!("{}/chat/completions", cfg.llm_endpoint()),
            api_key: cfg.api_key().map(str::to_string),
            reasoning_model: cfg.model_for(ModelTier::Reasoning).to_string(),
            light_model: cfg.model_for(ModelTier::Light).to_string(),
            timeout: cfg.timeout(),
        })
    }

    fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Reasoning => &self.reasoning_model,
            ModelTier::Light => &self.light_model,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str, tier: ModelTier) -> AnalysisResult<RawCompletion> {
        let request = ChatCompletionRequest {
            model: self.model(tier),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AnalysisError::BackendTimeout(self.timeout)
            } else {
                AnalysisError::BackendUnavailable(format!("request failed: {}", e))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::BackendUnavailable(format!(
                "HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        let parsed: ChatCompletionResponse = resp.json().await.map_err(|e| {
            AnalysisError::BackendUnavailable(format!("invalid completion envelope: {}", e))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AnalysisError::BackendUnavailable("completion contained no message content".into())
            })?;

        Ok(RawCompletion::new(content))
    }
}

/// Calls a backend once per prompt, bounded by a timeout.
#[derive(Clone)]
pub struct CompletionInvoker {
    backend: Arc<dyn CompletionBackend>,
    timeout: Duration,
    transcripts: Option<TranscriptWriter>,
}

impl CompletionInvoker {
    pub fn new(backend: Arc<dyn CompletionBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            transcripts: None,
        }
    }

    /// Record every prompt/reply pair under `writer`'s directory.
    pub fn with_transcripts(mut self, writer: TranscriptWriter) -> Self {
        self.transcripts = Some(writer);
        self
    }

    /// Invoke the backend for `task`.
    ///
    /// # Errors
    /// - `BackendTimeout` if the backend did not answer within the timeout.
    /// - `BackendUnavailable` if the backend failed or answered with only whitespace.
    pub async fn invoke(
        &self,
        task: TaskKind,
        request_id: Uuid,
        prompt: &str,
    ) -> AnalysisResult<RawCompletion> {
        let tier = task.descriptor().model_tier;
        tracing::debug!(
            task = task.name(),
            %request_id,
            prompt_len = prompt.len(),
            "invoking completion backend"
        );

        let reply = tokio::time::timeout(self.timeout, self.backend.complete(prompt, tier))
            .await
            .map_err(|_| AnalysisError::BackendTimeout(self.timeout))??;

        tracing::debug!(
            task = task.name(),
            %request_id,
            reply_len = reply.as_str().len(),
            "completion received"
        );

        if let Some(writer) = &self.transcripts {
            if let Err(e) = writer.write(task, request_id, prompt, reply.as_str()).await {
                tracing::warn!(
                    "failed to write transcript to {}: {}",
                    writer.dir().display(),
                    e
                );
            }
        }

        if reply.as_str().trim().is_empty() {
            return Err(AnalysisError::BackendUnavailable(
                "completion was empty".into(),
            ));
        }

        Ok(reply)
    }
}
