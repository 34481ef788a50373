//! # Temporal Core
//!
//! Core logic for the temporal text analysis service.
//!
//! This crate turns a passage of text into structured analyses by asking a language model:
//! - Prompt construction from fixed per-task templates (`prompt`, `task`)
//! - A single, time-bounded completion call per analysis (`completion`)
//! - Normalisation of untrusted model replies into schema-shaped JSON (`normalize`)
//! - The combined events/causation/entity-relations envelope (`envelope`)
//!
//! **No API concerns**: HTTP routing, form parsing and CORS belong in `api-rest` and `api-shared`.

pub mod analysis;
pub mod completion;
pub mod config;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod normalize;
pub mod prompt;
pub mod task;
pub mod transcript;

pub use analysis::{AnalysisRequest, AnalysisService, MorphologyAnalysis};
pub use completion::{CompletionBackend, CompletionInvoker, OpenAiBackend, RawCompletion};
pub use config::{ConfigValues, CoreConfig};
pub use constants::{DEFAULT_LANGUAGE, DEFAULT_REST_ADDR};
pub use envelope::MergedAnalysisEnvelope;
pub use error::{AnalysisError, AnalysisResult};
pub use normalize::{normalize, NormalizedResult};
pub use prompt::build_prompt;
pub use task::{ModelTier, TaskKind};
