//! The analysis pipeline.
//!
//! Every task runs through the same steps: build the prompt from the task's template, invoke the
//! completion backend once, and normalise the reply. [`AnalysisService::run`] is that pipeline;
//! the `analyze_*` methods are thin entry points that fill in an [`AnalysisRequest`].

use crate::completion::{CompletionInvoker, OpenAiBackend};
use crate::config::CoreConfig;
use crate::constants::{DEFAULT_LANGUAGE, WORD_KEY};
use crate::envelope::MergedAnalysisEnvelope;
use crate::normalize::{normalize, NormalizedResult};
use crate::prompt::build_prompt;
use crate::task::TaskKind;
use crate::transcript::TranscriptWriter;
use crate::AnalysisResult;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// One analysis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub task: TaskKind,
    /// The passage to analyse; for morphology, the word.
    pub text: String,
    pub language: String,
    /// Only used by the event/timeline task.
    pub doc_date: Option<String>,
}

impl AnalysisRequest {
    pub fn new(task: TaskKind, text: impl Into<String>) -> Self {
        Self {
            task,
            text: text.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            doc_date: None,
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn doc_date(mut self, doc_date: Option<String>) -> Self {
        self.doc_date = doc_date;
        self
    }
}

/// Result of the morphology task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MorphologyAnalysis {
    pub word: String,
    pub analysis: String,
}

/// Runs analysis tasks against a completion backend.
#[derive(Clone)]
pub struct AnalysisService {
    invoker: Arc<CompletionInvoker>,
}

impl AnalysisService {
    pub fn new(invoker: CompletionInvoker) -> Self {
        Self {
            invoker: Arc::new(invoker),
        }
    }

    /// Build a service backed by the OpenAI-compatible endpoint in `cfg`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the HTTP client cannot be created.
    pub fn from_config(cfg: &CoreConfig) -> AnalysisResult<Self> {
        let backend = OpenAiBackend::new(cfg)?;
        let mut invoker = CompletionInvoker::new(Arc::new(backend), cfg.timeout());
        if let Some(dir) = cfg.transcript_dir() {
            tracing::info!("writing completion transcripts to {}", dir.display());
            invoker = invoker.with_transcripts(TranscriptWriter::new(dir));
        }
        Ok(Self::new(invoker))
    }

    /// Run one task: build the prompt, invoke the backend, normalise the reply.
    ///
    /// # Errors
    /// Returns `BackendUnavailable` or `BackendTimeout` when the backend produced no usable
    /// reply. A reply that does not decode is not an error; it comes back as
    /// [`NormalizedResult::Failure`].
    pub async fn run(&self, request: &AnalysisRequest) -> AnalysisResult<NormalizedResult> {
        let task = request.task;
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "analysis",
            task = task.name(),
            tier = ?task.descriptor().model_tier,
            %request_id
        );

        async move {
            let prompt = build_prompt(
                task,
                &request.text,
                &request.language,
                request.doc_date.as_deref(),
            );

            let raw = self.invoker.invoke(task, request_id, &prompt).await?;
            let result = normalize(raw.as_str(), task);

            tracing::info!(success = result.is_success(), "analysis finished");
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Run one task and render the JSON payload returned to callers.
    ///
    /// Same as [`AnalysisService::run`] followed by [`NormalizedResult::into_payload`], except
    /// that the morphology payload also carries the analysed word.
    ///
    /// # Errors
    /// As [`AnalysisService::run`].
    pub async fn payload(&self, request: &AnalysisRequest) -> AnalysisResult<Value> {
        let mut payload = self.run(request).await?.into_payload(request.task);
        if request.task == TaskKind::Morphology {
            if let Value::Object(map) = &mut payload {
                map.insert(WORD_KEY.into(), Value::String(request.text.clone()));
            }
        }
        Ok(payload)
    }

    /// Extract events, entities, temporal references and a timeline.
    pub async fn analyze_events(
        &self,
        text: &str,
        doc_date: Option<&str>,
        language: &str,
    ) -> AnalysisResult<NormalizedResult> {
        let request = AnalysisRequest::new(TaskKind::EventTimeline, text)
            .language(language)
            .doc_date(doc_date.map(str::to_string));
        self.run(&request).await
    }

    /// Extract the causal graph between events.
    pub async fn analyze_causation(
        &self,
        text: &str,
        language: &str,
    ) -> AnalysisResult<NormalizedResult> {
        self.run(&AnalysisRequest::new(TaskKind::Causation, text).language(language))
            .await
    }

    /// Extract relations between entities.
    pub async fn analyze_entities(
        &self,
        text: &str,
        language: &str,
    ) -> AnalysisResult<NormalizedResult> {
        self.run(&AnalysisRequest::new(TaskKind::EntityRelations, text).language(language))
            .await
    }

    /// Tag every token with its part of speech.
    pub async fn analyze_parts_of_speech(
        &self,
        text: &str,
        language: &str,
    ) -> AnalysisResult<NormalizedResult> {
        self.run(&AnalysisRequest::new(TaskKind::PartOfSpeech, text).language(language))
            .await
    }

    /// Describe the morphology of a single word.
    pub async fn analyze_morphology(
        &self,
        word: &str,
        language: &str,
    ) -> AnalysisResult<MorphologyAnalysis> {
        let result = self
            .run(&AnalysisRequest::new(TaskKind::Morphology, word).language(language))
            .await?;

        let analysis = match result {
            NormalizedResult::Success(Value::String(text)) => text,
            other => other.into_payload(TaskKind::Morphology).to_string(),
        };

        Ok(MorphologyAnalysis {
            word: word.to_string(),
            analysis,
        })
    }

    /// Run events, causation and entity relations concurrently and merge them.
    ///
    /// All three always run to completion. A part whose backend call failed is reported inside
    /// the envelope; the call itself only fails when every part failed.
    ///
    /// # Errors
    /// Returns the timeline part's backend error when all three parts failed.
    pub async fn analyze_combined(
        &self,
        text: &str,
        doc_date: Option<&str>,
        language: &str,
    ) -> AnalysisResult<MergedAnalysisEnvelope> {
        let (timeline, causation, entities) = tokio::join!(
            self.analyze_events(text, doc_date, language),
            self.analyze_causation(text, language),
            self.analyze_entities(text, language),
        );

        match (timeline, causation, entities) {
            (Err(e), Err(_), Err(_)) => {
                tracing::error!("all combined analysis parts failed: {}", e);
                Err(e)
            }
            (timeline, causation, entities) => {
                let envelope = MergedAnalysisEnvelope::merge(timeline, causation, entities);
                if envelope.is_partial() {
                    tracing::warn!(
                        failed = ?envelope.errors.keys().collect::<Vec<_>>(),
                        "combined analysis partially failed"
                    );
                }
                Ok(envelope)
            }
        }
    }
}
