//! Analysis task kinds and their descriptors.
//!
//! Each task is described by a static [`TaskDescriptor`]: which prompt template to use, whether
//! the reply is expected to be JSON, which model tier runs it, and the canonical empty value that
//! stands in for a reply that cannot be decoded. The pipeline in [`crate::analysis`] is written
//! once against this table.

use crate::constants::{ANALYSIS_KEY, WORD_KEY};
use crate::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

/// The analysis variants the service offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    EventTimeline,
    Causation,
    EntityRelations,
    PartOfSpeech,
    Morphology,
}

/// Which configured model runs a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Extraction tasks that benefit from a reasoning model.
    Reasoning,
    /// Short, cheap tasks.
    Light,
}

/// Static description of one task.
#[derive(Debug)]
pub struct TaskDescriptor {
    pub kind: TaskKind,
    /// Stable name used in logs, transcripts and the CLI.
    pub name: &'static str,
    /// Instruction template compiled into the binary.
    pub template: &'static str,
    /// False only for free-text replies (morphology).
    pub expects_json: bool,
    pub model_tier: ModelTier,
    /// Whether the prompt carries a `Document Date:` line.
    pub includes_document_date: bool,
    /// Whether the input is substituted into the template's `{word}` slot instead of appended.
    pub inline_input: bool,
}

static EVENT_TIMELINE: TaskDescriptor = TaskDescriptor {
    kind: TaskKind::EventTimeline,
    name: "event_timeline",
    template: include_str!("../prompts/event_timeline.txt"),
    expects_json: true,
    model_tier: ModelTier::Reasoning,
    includes_document_date: true,
    inline_input: false,
};

static CAUSATION: TaskDescriptor = TaskDescriptor {
    kind: TaskKind::Causation,
    name: "causation",
    template: include_str!("../prompts/causation.txt"),
    expects_json: true,
    model_tier: ModelTier::Reasoning,
    includes_document_date: false,
    inline_input: false,
};

static ENTITY_RELATIONS: TaskDescriptor = TaskDescriptor {
    kind: TaskKind::EntityRelations,
    name: "entity_relations",
    template: include_str!("../prompts/entity_relations.txt"),
    expects_json: true,
    model_tier: ModelTier::Reasoning,
    includes_document_date: false,
    inline_input: false,
};

static PART_OF_SPEECH: TaskDescriptor = TaskDescriptor {
    kind: TaskKind::PartOfSpeech,
    name: "part_of_speech",
    template: include_str!("../prompts/part_of_speech.txt"),
    expects_json: true,
    model_tier: ModelTier::Light,
    includes_document_date: false,
    inline_input: false,
};

static MORPHOLOGY: TaskDescriptor = TaskDescriptor {
    kind: TaskKind::Morphology,
    name: "morphology",
    template: include_str!("../prompts/morphology.txt"),
    expects_json: false,
    model_tier: ModelTier::Light,
    includes_document_date: false,
    inline_input: true,
};

/// Entity categories the event/timeline prompt groups `named_entities` into.
pub const NAMED_ENTITY_CATEGORIES: &[&str] = &[
    "persons",
    "organizations",
    "locations",
    "institutions",
    "dates",
    "legal_terms",
];

impl TaskKind {
    pub const ALL: [TaskKind; 5] = [
        TaskKind::EventTimeline,
        TaskKind::Causation,
        TaskKind::EntityRelations,
        TaskKind::PartOfSpeech,
        TaskKind::Morphology,
    ];

    pub fn descriptor(self) -> &'static TaskDescriptor {
        match self {
            TaskKind::EventTimeline => &EVENT_TIMELINE,
            TaskKind::Causation => &CAUSATION,
            TaskKind::EntityRelations => &ENTITY_RELATIONS,
            TaskKind::PartOfSpeech => &PART_OF_SPEECH,
            TaskKind::Morphology => &MORPHOLOGY,
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// The value a reply for this task collapses to when it cannot be decoded.
    ///
    /// Same top-level keys as a successful payload; containers empty, scalars empty strings.
    pub fn canonical_empty(self) -> Value {
        match self {
            TaskKind::EventTimeline => {
                let named_entities: serde_json::Map<String, Value> = NAMED_ENTITY_CATEGORIES
                    .iter()
                    .map(|category| (category.to_string(), json!([])))
                    .collect();
                json!({
                    "events": [],
                    "named_entities": named_entities,
                    "temporal_references": [],
                    "important_notes": [],
                    "timeline_of_events": [],
                    "summary": "",
                })
            }
            TaskKind::Causation => json!({ "events": {}, "relations": [] }),
            TaskKind::EntityRelations => json!({ "entity_relations": [] }),
            TaskKind::PartOfSpeech => json!({ "parts_of_speech": [] }),
            TaskKind::Morphology => json!({ WORD_KEY: "", ANALYSIS_KEY: "" }),
        }
    }

    /// Top-level keys every payload for this task carries.
    #[cfg(test)]
    pub(crate) fn canonical_keys(self) -> Vec<String> {
        match self.canonical_empty() {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskKind {
    type Err = AnalysisError;

    /// Accepts the descriptor name plus the short aliases used on the command line.
    fn from_str(s: &str) -> AnalysisResult<Self> {
        let normalised = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalised.as_str() {
            "event_timeline" | "events" | "timeline" => Ok(TaskKind::EventTimeline),
            "causation" => Ok(TaskKind::Causation),
            "entity_relations" | "entities" => Ok(TaskKind::EntityRelations),
            "part_of_speech" | "pos" => Ok(TaskKind::PartOfSpeech),
            "morphology" => Ok(TaskKind::Morphology),
            _ => Err(AnalysisError::InvalidTask(s.to_string())),
        }
    }
}
