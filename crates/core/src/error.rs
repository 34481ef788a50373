use std::time::Duration;

/// Failures that escape the analysis pipeline.
///
/// A reply that cannot be decoded is not represented here: it is recovered inside the pipeline
/// as a [`crate::NormalizedResult::Failure`] carrying the task's canonical empty value.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("unknown analysis task: {0}")]
    InvalidTask(String),
    #[error("completion backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("completion backend timed out after {}s", .0.as_secs_f64())]
    BackendTimeout(Duration),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
