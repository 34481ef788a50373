//! Request and response types for the HTTP surface.
//!
//! Requests are form-encoded. Analysis payloads are passed through from the core as JSON values;
//! the typed structs below describe their documented shape for the OpenAPI schema.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Language used when a form omits `language`.
pub const DEFAULT_FORM_LANGUAGE: &str = "English";

fn default_language() -> String {
    DEFAULT_FORM_LANGUAGE.to_string()
}

/// Form for `/analyze` and the single-task text endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct AnalyzeForm {
    /// Passage to analyse.
    #[serde(default)]
    pub input_text: String,
    /// Document date used to anchor relative dates; may be empty.
    #[serde(default)]
    pub doc_date: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl AnalyzeForm {
    /// The document date, or `None` when the field was empty.
    pub fn doc_date(&self) -> Option<&str> {
        let trimmed = self.doc_date.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Form for `/analyze_pos`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct PosForm {
    #[serde(default)]
    pub input_text: String,
    #[serde(default = "default_language")]
    pub language: String,
}

/// Form for `/analyze_morphology`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct MorphologyForm {
    #[serde(default)]
    pub word: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of every non-200 response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct MorphologyRes {
    pub word: String,
    pub analysis: String,
}

/// One tagged token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct PosToken {
    pub token: String,
    #[serde(rename = "tokenId")]
    pub token_id: u32,
    #[serde(rename = "partOfSpeech")]
    pub part_of_speech: String,
}

/// Fields present on any analysis payload whose reply could not be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct FallbackFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct PartsOfSpeechRes {
    pub parts_of_speech: Vec<PosToken>,
    #[serde(flatten)]
    pub fallback: FallbackFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct EntityRelation {
    pub source_entity: String,
    pub target_entity: String,
    pub relation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct EntityRelationsRes {
    pub entity_relations: Vec<EntityRelation>,
    #[serde(flatten)]
    pub fallback: FallbackFields,
}

/// Directed edge between two event identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct CausalRelation {
    pub source: String,
    pub target: String,
    /// One of CAUSES, ENABLES, PREVENTS, BEFORE, AFTER.
    #[serde(rename = "type")]
    pub relation_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct CausationRes {
    /// Event identifier to short summary.
    pub events: BTreeMap<String, String>,
    pub relations: Vec<CausalRelation>,
    #[serde(flatten)]
    pub fallback: FallbackFields,
}

/// Event/timeline payload. Nested objects are model-shaped and documented in the prompt.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct EventTimelineRes {
    #[schema(value_type = Vec<Object>)]
    pub events: Vec<serde_json::Value>,
    /// One array per category: persons, organizations, locations, institutions, dates, legal_terms.
    #[schema(value_type = Object)]
    pub named_entities: serde_json::Value,
    #[schema(value_type = Vec<Object>)]
    pub temporal_references: Vec<serde_json::Value>,
    #[schema(value_type = Vec<Object>)]
    pub important_notes: Vec<serde_json::Value>,
    #[schema(value_type = Vec<Object>)]
    pub timeline_of_events: Vec<serde_json::Value>,
    pub summary: String,
    #[serde(flatten)]
    pub fallback: FallbackFields,
}

/// Response of `/analyze`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct AnalyzeRes {
    #[serde(flatten)]
    pub timeline: EventTimelineRes,
    pub event_relations: CausationRes,
    pub entity_relations: Vec<EntityRelation>,
    /// Failed parts (`timeline`, `causation`, `entity_relations`) and why. Absent when all
    /// parts succeeded.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analyze_form_defaults() {
        let form: AnalyzeForm =
            serde_json::from_value(json!({ "input_text": "text" })).expect("form decodes");
        assert_eq!(form.language, DEFAULT_FORM_LANGUAGE);
        assert_eq!(form.doc_date(), None);

        let form: AnalyzeForm = serde_json::from_value(json!({ "doc_date": " 2025-01-16 " }))
            .expect("form decodes");
        assert_eq!(form.input_text, "");
        assert_eq!(form.doc_date(), Some("2025-01-16"));
    }

    #[test]
    fn pos_token_uses_camel_case_keys() {
        let token: PosToken = serde_json::from_value(
            json!({ "token": "runs", "tokenId": 1, "partOfSpeech": "Verb" }),
        )
        .expect("token decodes");
        assert_eq!(token.token_id, 1);
        assert_eq!(token.part_of_speech, "Verb");
    }

    #[test]
    fn analyze_response_shape_matches_documented_envelope() {
        let res: AnalyzeRes = serde_json::from_value(json!({
            "events": [],
            "named_entities": { "persons": [] },
            "temporal_references": [],
            "important_notes": [],
            "timeline_of_events": [],
            "summary": "",
            "event_relations": {
                "events": { "e1": "Tariffs imposed" },
                "relations": [{ "source": "e1", "target": "e1", "type": "CAUSES" }]
            },
            "entity_relations": [],
            "errors": { "entity_relations": "JSON parsing failed" }
        }))
        .expect("envelope decodes");

        assert_eq!(res.event_relations.relations[0].relation_type, "CAUSES");
        assert_eq!(res.errors["entity_relations"], "JSON parsing failed");
        assert!(res.timeline.fallback.error.is_none());
    }
}
