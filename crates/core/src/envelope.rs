//! The merged response of the combined analysis.
//!
//! Event/timeline, causation and entity-relation results are gathered into one object. Each part
//! succeeds or fails on its own: a failed part contributes its canonical empty value and is listed
//! under `errors`, so callers can tell partial from total failure without inspecting every key.
//! The timeline and causation parts also keep their own `error`/`raw_output` keys verbatim.

use crate::constants::ERROR_KEY;
use crate::normalize::NormalizedResult;
use crate::task::TaskKind;
use crate::AnalysisResult;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const TIMELINE_PART: &str = "timeline";
pub const CAUSATION_PART: &str = "causation";
pub const ENTITY_RELATIONS_PART: &str = "entity_relations";

const EVENT_RELATIONS_KEY: &str = "event_relations";
const ENTITY_RELATIONS_KEY: &str = "entity_relations";
const ERRORS_KEY: &str = "errors";

/// Combined result of the three extraction tasks.
///
/// Serialises as the event/timeline keys at the top level, the causation graph under
/// `event_relations`, the entity relation list under `entity_relations`, and, when anything
/// failed, an `errors` object keyed by part.
///
/// `entity_relations` is always a bare array, so that part's own `error` and `raw_output` keys
/// are not carried over: its failure is reported only through `errors["entity_relations"]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedAnalysisEnvelope {
    #[serde(flatten)]
    pub timeline: Map<String, Value>,
    pub event_relations: Value,
    pub entity_relations: Value,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl MergedAnalysisEnvelope {
    /// Merge three independent outcomes. No outcome can blank out another.
    pub fn merge(
        timeline: AnalysisResult<NormalizedResult>,
        causation: AnalysisResult<NormalizedResult>,
        entities: AnalysisResult<NormalizedResult>,
    ) -> Self {
        let mut errors = BTreeMap::new();

        let mut timeline =
            match part_payload(TaskKind::EventTimeline, TIMELINE_PART, timeline, &mut errors) {
                Value::Object(map) => map,
                _ => Map::new(),
            };
        // These keys belong to the other parts of the envelope.
        for reserved in [EVENT_RELATIONS_KEY, ENTITY_RELATIONS_KEY, ERRORS_KEY] {
            timeline.remove(reserved);
        }

        let event_relations =
            part_payload(TaskKind::Causation, CAUSATION_PART, causation, &mut errors);

        let entity_relations = match part_payload(
            TaskKind::EntityRelations,
            ENTITY_RELATIONS_PART,
            entities,
            &mut errors,
        ) {
            Value::Object(mut map) => map
                .remove(ENTITY_RELATIONS_KEY)
                .unwrap_or_else(|| Value::Array(Vec::new())),
            _ => Value::Array(Vec::new()),
        };

        Self {
            timeline,
            event_relations,
            entity_relations,
            errors,
        }
    }

    /// True if at least one part failed.
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

fn part_payload(
    task: TaskKind,
    part: &str,
    outcome: AnalysisResult<NormalizedResult>,
    errors: &mut BTreeMap<String, String>,
) -> Value {
    match outcome {
        Ok(result) => {
            if let Some(error) = result.error() {
                errors.insert(part.to_string(), error.to_string());
            }
            result.into_payload(task)
        }
        Err(e) => {
            let message = e.to_string();
            errors.insert(part.to_string(), message.clone());
            let mut fallback = task.canonical_empty();
            if let Value::Object(map) = &mut fallback {
                map.insert(ERROR_KEY.into(), Value::String(message));
            }
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{JSON_PARSE_FAILED, RAW_OUTPUT_KEY};
    use crate::normalize::normalize;
    use crate::AnalysisError;
    use serde_json::json;

    fn timeline_success() -> NormalizedResult {
        normalize(
            r#"{"events": [{"verb": "announced"}], "named_entities": {"persons": [{"entity": "Biden"}]}, "temporal_references": [], "important_notes": ["note"], "timeline_of_events": [], "summary": "A policy was announced."}"#,
            TaskKind::EventTimeline,
        )
    }

    fn entities_success() -> NormalizedResult {
        normalize(
            r#"{"entity_relations": [{"source_entity": "owner", "target_entity": "cat", "relation": "owns"}]}"#,
            TaskKind::EntityRelations,
        )
    }

    #[test]
    fn failure_in_one_part_leaves_others_untouched() {
        let envelope = MergedAnalysisEnvelope::merge(
            Ok(timeline_success()),
            Ok(normalize("I could not find any events.", TaskKind::Causation)),
            Ok(entities_success()),
        );

        assert_eq!(envelope.timeline["summary"], json!("A policy was announced."));
        assert_eq!(envelope.timeline["events"], json!([{ "verb": "announced" }]));
        assert_eq!(
            envelope.entity_relations,
            json!([{ "source_entity": "owner", "target_entity": "cat", "relation": "owns" }])
        );

        assert_eq!(envelope.event_relations["events"], json!({}));
        assert_eq!(envelope.event_relations["relations"], json!([]));
        assert_eq!(envelope.event_relations[ERROR_KEY], json!(JSON_PARSE_FAILED));
        assert_eq!(
            envelope.event_relations[RAW_OUTPUT_KEY],
            json!("I could not find any events.")
        );

        assert!(envelope.is_partial());
        assert_eq!(envelope.errors.len(), 1);
        assert_eq!(envelope.errors[CAUSATION_PART], JSON_PARSE_FAILED);
        assert!(!envelope.timeline.contains_key(ERROR_KEY));
    }

    #[test]
    fn serialised_envelope_has_expected_top_level_keys() {
        let envelope = MergedAnalysisEnvelope::merge(
            Ok(timeline_success()),
            Ok(normalize(
                r#"{"events": {"e1": "Policy announced"}, "relations": []}"#,
                TaskKind::Causation,
            )),
            Ok(entities_success()),
        );

        let value = serde_json::to_value(&envelope).expect("envelope serialises");
        let mut keys: Vec<&str> = value
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();

        assert_eq!(
            keys,
            vec![
                "entity_relations",
                "event_relations",
                "events",
                "important_notes",
                "named_entities",
                "summary",
                "temporal_references",
                "timeline_of_events",
            ]
        );
        assert_eq!(value["event_relations"]["events"]["e1"], json!("Policy announced"));
    }

    #[test]
    fn timeline_failure_keeps_error_at_top_level() {
        let envelope = MergedAnalysisEnvelope::merge(
            Ok(normalize("Sorry, I can't help with that.", TaskKind::EventTimeline)),
            Ok(normalize(r#"{"events": {}, "relations": []}"#, TaskKind::Causation)),
            Ok(entities_success()),
        );

        let value = serde_json::to_value(&envelope).expect("envelope serialises");
        assert_eq!(value[ERROR_KEY], json!(JSON_PARSE_FAILED));
        assert_eq!(value["summary"], json!(""));
        assert_eq!(value["errors"][TIMELINE_PART], json!(JSON_PARSE_FAILED));
        assert!(value["event_relations"].get(ERROR_KEY).is_none());
    }

    #[test]
    fn backend_failure_is_reported_per_part() {
        let envelope = MergedAnalysisEnvelope::merge(
            Ok(timeline_success()),
            Ok(normalize(r#"{"events": {}, "relations": []}"#, TaskKind::Causation)),
            Err(AnalysisError::BackendUnavailable("HTTP 503".into())),
        );

        assert_eq!(envelope.entity_relations, json!([]));
        assert!(envelope.errors[ENTITY_RELATIONS_PART].contains("HTTP 503"));
        assert_eq!(envelope.timeline["summary"], json!("A policy was announced."));
    }

    #[test]
    fn model_cannot_overwrite_other_parts_through_timeline_keys() {
        let envelope = MergedAnalysisEnvelope::merge(
            Ok(normalize(
                r#"{"events": [], "entity_relations": ["bogus"], "event_relations": "bogus"}"#,
                TaskKind::EventTimeline,
            )),
            Ok(normalize(r#"{"events": {}, "relations": []}"#, TaskKind::Causation)),
            Ok(entities_success()),
        );

        let value = serde_json::to_value(&envelope).expect("envelope serialises");
        assert_eq!(value["event_relations"], json!({ "events": {}, "relations": [] }));
        assert_eq!(value["entity_relations"][0]["relation"], json!("owns"));
    }

    #[test]
    fn entity_failure_is_reported_only_under_errors() {
        let envelope = MergedAnalysisEnvelope::merge(
            Ok(timeline_success()),
            Ok(normalize(r#"{"events": {}, "relations": []}"#, TaskKind::Causation)),
            Ok(normalize("No relations found.", TaskKind::EntityRelations)),
        );

        let value = serde_json::to_value(&envelope).expect("envelope serialises");
        assert_eq!(value["entity_relations"], json!([]));
        assert_eq!(value["errors"][ENTITY_RELATIONS_PART], json!(JSON_PARSE_FAILED));
        assert!(value.get(ERROR_KEY).is_none());
        assert!(value.get(RAW_OUTPUT_KEY).is_none());
    }
}
