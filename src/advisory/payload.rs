//! Whole-response parsing into the six raw advisory fields.

use serde_json::{Map, Number, Value};

use super::assemble::assemble;
use super::document::AdvisoryDocument;
use super::field;
use super::recover::{recover, RecoveryResult};
use crate::types::ExtractionConfig;

const DIAGNOSTIC_FIELDS: &[&str] = &["diagnostic", "diagnostique"];
const ACTIONS_FIELDS: &[&str] = &[
    "actions_recommended",
    "actionsRecommended",
    "actions_recommandees",
    "actions_recommandées",
    "actions",
];
const RISKS_FIELDS: &[&str] = &["risks", "risques"];
const QUERY_FIELDS: &[&str] = &[
    "suggested_query",
    "suggestedQuery",
    "suggested_queries",
    "suggestedQueries",
    "sql_suggere",
    "sql_suggéré",
];
const CONFIDENCE_FIELDS: &[&str] = &[
    "confidence_level",
    "confidenceLevel",
    "confidence",
    "niveau_confiance",
];
const NOTES_FIELDS: &[&str] = &[
    "supplementary_notes",
    "supplementaryNotes",
    "notes",
    "notes_complementaires",
    "notes_complémentaires",
];

/// The advisory response before normalization. Each field is whatever the
/// model sent, untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAdvisoryPayload {
    pub diagnostic: Option<Value>,
    pub actions_recommended: Option<Value>,
    pub risks: Option<Value>,
    pub suggested_query: Option<Value>,
    pub confidence_level: Option<Value>,
    pub supplementary_notes: Option<Value>,
}

impl RawAdvisoryPayload {
    /// Read the payload fields from `obj`, English or French names.
    /// Returns `None` when the object carries none of them.
    pub fn from_object(obj: &Map<String, Value>) -> Option<Self> {
        let payload = Self {
            diagnostic: field(obj, DIAGNOSTIC_FIELDS).cloned(),
            actions_recommended: field(obj, ACTIONS_FIELDS).cloned(),
            risks: field(obj, RISKS_FIELDS).cloned(),
            suggested_query: field(obj, QUERY_FIELDS).cloned(),
            confidence_level: field(obj, CONFIDENCE_FIELDS).cloned(),
            supplementary_notes: field(obj, NOTES_FIELDS).cloned(),
        };
        (payload != Self::default()).then_some(payload)
    }

    /// Payload for a response that is not JSON: the whole text becomes the
    /// diagnostic.
    fn from_text(text: &str, config: &ExtractionConfig) -> Self {
        let trimmed = text.trim();
        Self {
            diagnostic: (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string())),
            confidence_level: Number::from_f64(config.fallback_confidence).map(Value::Number),
            ..Self::default()
        }
    }

    /// The numeric confidence, passed through unclamped. Anything that is
    /// not a JSON number falls back to the configured default.
    pub fn confidence(&self, config: &ExtractionConfig) -> f64 {
        match self.confidence_level.as_ref().and_then(Value::as_f64) {
            Some(confidence) => confidence,
            None => {
                log::warn!(
                    "Advisory confidence missing or not numeric ({:?}), using {}",
                    self.confidence_level,
                    config.fallback_confidence
                );
                config.fallback_confidence
            }
        }
    }

    pub fn has_suggested_sql(&self) -> bool {
        match &self.suggested_query {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(obj)) => !obj.is_empty(),
            Some(_) => true,
        }
    }

    pub fn assemble(&self, config: &ExtractionConfig) -> AdvisoryDocument {
        assemble(
            self.diagnostic.as_ref(),
            self.actions_recommended.as_ref(),
            self.risks.as_ref(),
            self.suggested_query.as_ref(),
            self.confidence(config),
            self.supplementary_notes.as_ref(),
            config,
        )
    }
}

/// Parse a complete model response into raw advisory fields.
///
/// Never fails: a response that yields no payload object degrades to a
/// prose diagnostic with the fallback confidence.
pub fn parse_advisor_response(text: &str, config: &ExtractionConfig) -> RawAdvisoryPayload {
    let obj = match recover(text, config) {
        RecoveryResult::Recovered {
            value: Value::Object(obj),
            ..
        } => obj,
        RecoveryResult::Recovered { value, .. } => {
            log::warn!(
                "Advisor response is JSON but not an object ({}), using raw text",
                json_kind(&value)
            );
            return RawAdvisoryPayload::from_text(text, config);
        }
        RecoveryResult::Unrecovered(_) => {
            log::warn!(
                "Could not parse advisor response as JSON ({} chars), using raw text",
                text.len()
            );
            return RawAdvisoryPayload::from_text(text, config);
        }
    };

    if let Some(payload) = RawAdvisoryPayload::from_object(&obj) {
        return payload;
    }

    let nested = obj.iter().find_map(|(key, value)| {
        let payload = RawAdvisoryPayload::from_object(value.as_object()?)?;
        log::debug!("Advisor payload found under `{}`", key);
        Some(payload)
    });
    nested.unwrap_or_else(|| {
        log::warn!("Advisor response JSON has no advisory fields, using raw text");
        RawAdvisoryPayload::from_text(text, config)
    })
}

/// Parse and assemble a model response in one step.
pub fn extract_advisory(text: &str, config: &ExtractionConfig) -> AdvisoryDocument {
    let payload = parse_advisor_response(text, config);
    if payload.has_suggested_sql() {
        log::warn!(
            "Advisory contains suggested SQL: review it manually, never execute automatically"
        );
    }
    payload.assemble(config)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
