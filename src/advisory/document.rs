//! Canonical advisory document.
//!
//! Every slot is a sum type over the shapes it accepts; `None` is the
//! absent shape. Documents are built once by [`super::assemble`] and are
//! read-only afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Prose and display segments
// =============================================================================

/// A renderable run of an already-segmented prose field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DisplaySegment {
    Text { text: String },
    /// A recovered JSON block, re-serialized for display.
    Json { json: String },
    Code {
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        content: String,
    },
}

/// A narrative field plus its display segmentation.
///
/// The normalizer creates prose with only `text` filled; the assembler
/// replaces it with the rendered text and segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prose {
    pub text: String,
    pub segments: Vec<DisplaySegment>,
}

impl Prose {
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            segments: Vec::new(),
        }
    }
}

// =============================================================================
// Slots
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredDiagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<Prose>,
    pub hypotheses: Vec<Prose>,
    pub preliminary_checks: Vec<Prose>,
}

impl StructuredDiagnostic {
    pub fn is_empty(&self) -> bool {
        self.current_state.is_none()
            && self.hypotheses.is_empty()
            && self.preliminary_checks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Diagnostic {
    Structured(StructuredDiagnostic),
    Prose(Prose),
}

/// Action priority.
///
/// Serialized as a bare lowercase word; unrecognized labels are kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    Other(String),
}

const CRITICAL_WORDS: &[&str] = &[
    "critical", "critique", "urgent", "urgente", "bloquant", "blocker", "p0",
];
const HIGH_WORDS: &[&str] = &[
    "high", "haute", "haut", "elevee", "élevée", "élevé", "important", "p1",
];
const MEDIUM_WORDS: &[&str] = &[
    "medium", "moyenne", "moyen", "normal", "normale", "modérée", "p2",
];
const LOW_WORDS: &[&str] = &["low", "basse", "bas", "faible", "p3"];

impl Priority {
    /// Map a model-supplied priority label.
    ///
    /// Configured aliases win over the built-in English/French vocabulary.
    /// Blank labels yield `None`.
    pub fn parse(raw: &str, aliases: &BTreeMap<String, Priority>) -> Option<Priority> {
        let label = raw.trim();
        if label.is_empty() {
            return None;
        }
        let lower = label.to_lowercase();

        if let Some((_, p)) = aliases
            .iter()
            .find(|(alias, _)| alias.trim().to_lowercase() == lower)
        {
            return Some(p.clone());
        }

        let vocab: [(&[&str], Priority); 4] = [
            (CRITICAL_WORDS, Priority::Critical),
            (HIGH_WORDS, Priority::High),
            (MEDIUM_WORDS, Priority::Medium),
            (LOW_WORDS, Priority::Low),
        ];
        for (words, priority) in vocab {
            if words.contains(&lower.as_str()) {
                return Some(priority);
            }
        }
        Some(Priority::Other(label.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Other(label) => label,
        }
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critical" => Priority::Critical,
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            _ => Priority::Other(s),
        }
    }
}

impl From<Priority> for String {
    fn from(p: Priority) -> Self {
        p.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionDetails {
    Prose(Prose),
    List(Vec<Prose>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ActionDetails>,
    pub dependencies: Vec<String>,
    pub tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Actions {
    Records(Vec<ActionRecord>),
    Strings(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRecord {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Prose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Prose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<Prose>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Risks {
    Records(Vec<RiskRecord>),
    Strings(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SuggestedQueries {
    Single(String),
    List(Vec<QueryEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notes {
    pub recommended_tools: Vec<String>,
    pub best_practices: Vec<String>,
}

// =============================================================================
// Document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryDocument {
    pub diagnostic: Option<Diagnostic>,
    pub actions: Option<Actions>,
    pub risks: Option<Risks>,
    pub suggested_queries: Option<SuggestedQueries>,
    /// Passed through as received; not clamped to [0, 1].
    pub confidence: f64,
    pub notes: Option<Notes>,
}

impl AdvisoryDocument {
    /// True when any renderable slot is present. Confidence and notes
    /// alone do not count.
    pub fn has_content(&self) -> bool {
        self.diagnostic.is_some()
            || self.actions.is_some()
            || self.risks.is_some()
            || self.suggested_queries.is_some()
    }

    /// Visit every prose field in slot order.
    pub(crate) fn for_each_prose_mut(&mut self, f: &mut impl FnMut(&mut Prose)) {
        match &mut self.diagnostic {
            Some(Diagnostic::Prose(p)) => f(p),
            Some(Diagnostic::Structured(d)) => {
                if let Some(p) = d.current_state.as_mut() {
                    f(p);
                }
                d.hypotheses.iter_mut().for_each(&mut *f);
                d.preliminary_checks.iter_mut().for_each(&mut *f);
            }
            None => {}
        }

        if let Some(Actions::Records(records)) = &mut self.actions {
            for record in records {
                match &mut record.details {
                    Some(ActionDetails::Prose(p)) => f(p),
                    Some(ActionDetails::List(items)) => items.iter_mut().for_each(&mut *f),
                    None => {}
                }
            }
        }

        if let Some(Risks::Records(records)) = &mut self.risks {
            for record in records {
                for p in [&mut record.cause, &mut record.impact, &mut record.mitigation]
                    .into_iter()
                    .flatten()
                {
                    f(p);
                }
            }
        }
    }
}
