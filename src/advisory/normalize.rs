//! Per-slot shape normalization.
//!
//! Each slot resolves its raw value the same way before applying its own
//! record rules:
//!
//! - absent, null, blank strings and bare scalars are absent;
//! - strings go through JSON recovery; a recovered array or object is used
//!   as the value, anything else keeps the text as prose;
//! - an object is searched for the first property, outside the slot's own
//!   record fields, holding the slot's richest shape (promotion); only
//!   when none yields a value is the object read as a single record, and
//!   only if it carries the slot's identifying key;
//! - arrays are records when element 0 is an object, strings otherwise.
//!
//! Nothing here fails: a value with no viable shape leaves the slot absent.

use serde_json::{Map, Value};

use super::document::{
    ActionDetails, ActionRecord, Actions, Diagnostic, Notes, Priority, Prose, QueryEntry,
    RiskRecord, Risks, StructuredDiagnostic, SuggestedQueries,
};
use super::fence;
use super::field;
use super::recover::{recover, RecoveryResult, RecoveryStrategy};
use crate::types::ExtractionConfig;

/// Bounds re-recovery of JSON strings that decode to more JSON strings.
const MAX_RECOVERY_DEPTH: usize = 4;

// Field aliases: canonical camelCase, snake_case, then the French schema.
const CURRENT_STATE_KEYS: &[&str] = &[
    "currentState",
    "current_state",
    "etat_actuel",
    "état_actuel",
    "etat",
    "state",
];
const HYPOTHESES_KEYS: &[&str] = &["hypotheses", "hypothesis"];
const CHECKS_KEYS: &[&str] = &[
    "preliminaryChecks",
    "preliminary_checks",
    "verifications_prealables",
    "vérifications_préalables",
    "verifications",
    "checks",
];

const ACTION_LABEL_KEYS: &[&str] = &["label", "action", "titre", "title", "nom", "name"];
const PRIORITY_KEYS: &[&str] = &["priority", "priorite", "priorité"];
const DETAILS_KEYS: &[&str] = &["details", "détails", "description"];
const DEPENDENCY_KEYS: &[&str] = &[
    "dependencies",
    "dependances",
    "dépendances",
    "prerequis",
    "prérequis",
];
const TOOL_KEYS: &[&str] = &["tools", "outils"];
const EXAMPLE_QUERY_KEYS: &[&str] = &[
    "exampleQuery",
    "example_query",
    "exemple_requete",
    "requete",
    "query",
    "sql",
];

const RISK_LABEL_KEYS: &[&str] = &["label", "risque", "risk", "titre", "title", "nom", "name"];
const CAUSE_KEYS: &[&str] = &["cause", "causes"];
const IMPACT_KEYS: &[&str] = &["impact", "impacts"];
const MITIGATION_KEYS: &[&str] = &["mitigation", "mitigations", "attenuation", "atténuation"];

const QUERY_KEYS: &[&str] = &["query", "requete", "requête", "sql"];
const DESCRIPTION_KEYS: &[&str] = &["description", "titre", "title"];

const RECOMMENDED_TOOLS_KEYS: &[&str] = &[
    "recommendedTools",
    "recommended_tools",
    "outils_recommandes",
    "outils_recommandés",
    "outils",
    "tools",
];
const BEST_PRACTICES_KEYS: &[&str] = &["bestPractices", "best_practices", "bonnes_pratiques"];

/// The semantic slots that carry shape rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Diagnostic,
    Actions,
    Risks,
    SuggestedQueries,
    Notes,
}

impl SlotKind {
    pub fn label(self) -> &'static str {
        match self {
            SlotKind::Diagnostic => "diagnostic",
            SlotKind::Actions => "actions",
            SlotKind::Risks => "risks",
            SlotKind::SuggestedQueries => "suggestedQueries",
            SlotKind::Notes => "notes",
        }
    }

    /// Every field a record of this slot may carry.
    fn field_keys(self) -> &'static [&'static [&'static str]] {
        match self {
            SlotKind::Diagnostic => &[CURRENT_STATE_KEYS, HYPOTHESES_KEYS, CHECKS_KEYS],
            SlotKind::Actions => &[
                ACTION_LABEL_KEYS,
                PRIORITY_KEYS,
                DETAILS_KEYS,
                DEPENDENCY_KEYS,
                TOOL_KEYS,
                EXAMPLE_QUERY_KEYS,
            ],
            SlotKind::Risks => &[RISK_LABEL_KEYS, CAUSE_KEYS, IMPACT_KEYS, MITIGATION_KEYS],
            SlotKind::SuggestedQueries => &[QUERY_KEYS, DESCRIPTION_KEYS],
            SlotKind::Notes => &[RECOMMENDED_TOOLS_KEYS, BEST_PRACTICES_KEYS],
        }
    }

    /// Fields that make an object a record of this slot on their own.
    /// Incidental keys such as `description` or `priority` do not.
    fn identifying_keys(self) -> &'static [&'static [&'static str]] {
        match self {
            SlotKind::Diagnostic | SlotKind::Notes => self.field_keys(),
            SlotKind::Actions => &[ACTION_LABEL_KEYS],
            SlotKind::Risks => &[RISK_LABEL_KEYS],
            SlotKind::SuggestedQueries => &[QUERY_KEYS],
        }
    }

    fn is_field_key(self, key: &str) -> bool {
        self.field_keys()
            .iter()
            .any(|aliases| aliases.contains(&key))
    }

    /// Whether `obj` carries an identifying field of this slot's record.
    fn matches_record(self, obj: &Map<String, Value>) -> bool {
        self.identifying_keys()
            .iter()
            .any(|aliases| aliases.iter().any(|key| obj.contains_key(*key)))
    }

    /// The shape promotion looks for inside a wrapping object.
    fn is_richest(self, value: &Value) -> bool {
        match self {
            SlotKind::Diagnostic | SlotKind::Notes => {
                value.as_object().is_some_and(|obj| self.matches_record(obj))
            }
            SlotKind::Actions | SlotKind::Risks | SlotKind::SuggestedQueries => {
                value.as_array().is_some_and(|items| !items.is_empty())
            }
        }
    }
}

// =============================================================================
// Shared resolution
// =============================================================================

enum Resolved {
    /// A structured value. `narrative` keeps the source text when the JSON
    /// was found inside surrounding prose, so the slot can fall back to it.
    Value {
        value: Value,
        narrative: Option<String>,
    },
    Prose(String),
    Absent,
}

fn resolve(slot: SlotKind, raw: Option<&Value>, config: &ExtractionConfig) -> Resolved {
    match raw {
        None | Some(Value::Null) => Resolved::Absent,
        Some(Value::String(text)) => resolve_text(slot, text, config, 0),
        Some(value @ (Value::Array(_) | Value::Object(_))) => Resolved::Value {
            value: value.clone(),
            narrative: None,
        },
        Some(other) => {
            log::debug!("{}: ignoring scalar value {}", slot.label(), other);
            Resolved::Absent
        }
    }
}

fn resolve_text(slot: SlotKind, text: &str, config: &ExtractionConfig, depth: usize) -> Resolved {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Resolved::Absent;
    }

    match recover(trimmed, config) {
        RecoveryResult::Recovered {
            value: value @ (Value::Array(_) | Value::Object(_)),
            strategy,
        } => {
            let embedded = !matches!(
                strategy,
                RecoveryStrategy::Direct | RecoveryStrategy::Delimited
            );
            Resolved::Value {
                value,
                narrative: embedded.then(|| trimmed.to_string()),
            }
        }
        RecoveryResult::Recovered {
            value: Value::String(inner),
            ..
        } if depth < MAX_RECOVERY_DEPTH => resolve_text(slot, &inner, config, depth + 1),
        _ => {
            log::debug!("{}: keeping text as prose", slot.label());
            Resolved::Prose(trimmed.to_string())
        }
    }
}

/// First property of `obj` whose value has the slot's richest shape.
/// The slot's own record fields (`tools`, `dependencies`, ...) are skipped.
fn promote<'a>(slot: SlotKind, obj: &'a Map<String, Value>) -> Option<&'a Value> {
    let (key, value) = obj
        .iter()
        .find(|(key, v)| !slot.is_field_key(key) && slot.is_richest(v))?;
    log::debug!("{}: promoted nested property `{}`", slot.label(), key);
    Some(value)
}

/// The object itself when it is a record of `slot`, else its promoted
/// object property. Diagnostic and notes records have no list fields, so
/// the record check can come first.
fn record_or_promoted<'a>(
    slot: SlotKind,
    obj: &'a Map<String, Value>,
) -> Option<&'a Map<String, Value>> {
    if slot.matches_record(obj) {
        Some(obj)
    } else {
        promote(slot, obj)?.as_object()
    }
}

// =============================================================================
// Slots
// =============================================================================

pub fn normalize_diagnostic(raw: Option<&Value>, config: &ExtractionConfig) -> Option<Diagnostic> {
    match resolve(SlotKind::Diagnostic, raw, config) {
        Resolved::Absent => None,
        Resolved::Prose(text) => Some(Diagnostic::Prose(Prose::raw(text))),
        Resolved::Value { value, narrative } => diagnostic_from_value(&value)
            .or_else(|| narrative.map(|text| Diagnostic::Prose(Prose::raw(text)))),
    }
}

fn diagnostic_from_value(value: &Value) -> Option<Diagnostic> {
    let record = record_or_promoted(SlotKind::Diagnostic, value.as_object()?)?;

    let diagnostic = StructuredDiagnostic {
        current_state: field(record, CURRENT_STATE_KEYS).and_then(prose_of),
        hypotheses: prose_list(field(record, HYPOTHESES_KEYS)),
        preliminary_checks: prose_list(field(record, CHECKS_KEYS)),
    };
    if diagnostic.is_empty() {
        None
    } else {
        Some(Diagnostic::Structured(diagnostic))
    }
}

pub fn normalize_actions(raw: Option<&Value>, config: &ExtractionConfig) -> Option<Actions> {
    match resolve(SlotKind::Actions, raw, config) {
        Resolved::Absent => None,
        Resolved::Prose(text) => Some(Actions::Strings(vec![text])),
        Resolved::Value { value, narrative } => actions_from_value(&value, config)
            .or_else(|| narrative.map(|text| Actions::Strings(vec![text]))),
    }
}

fn actions_from_value(value: &Value, config: &ExtractionConfig) -> Option<Actions> {
    match value {
        Value::Array(items) => actions_from_array(items, config),
        Value::Object(obj) => promote(SlotKind::Actions, obj)
            .and_then(Value::as_array)
            .and_then(|items| actions_from_array(items, config))
            .or_else(|| {
                SlotKind::Actions
                    .matches_record(obj)
                    .then(|| action_record(obj, config))
                    .flatten()
                    .map(|record| Actions::Records(vec![record]))
            }),
        _ => None,
    }
}

fn actions_from_array(items: &[Value], config: &ExtractionConfig) -> Option<Actions> {
    // Element 0 alone decides records vs strings.
    if items.first()?.is_object() {
        let records: Vec<ActionRecord> = items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|obj| action_record(obj, config))
            .collect();
        non_empty(records).map(Actions::Records)
    } else {
        non_empty(string_list(items)).map(Actions::Strings)
    }
}

fn action_record(obj: &Map<String, Value>, config: &ExtractionConfig) -> Option<ActionRecord> {
    let record = ActionRecord {
        label: field(obj, ACTION_LABEL_KEYS)
            .and_then(text_of)
            .unwrap_or_default(),
        priority: field(obj, PRIORITY_KEYS)
            .and_then(text_of)
            .and_then(|label| Priority::parse(&label, &config.priority_aliases)),
        details: field(obj, DETAILS_KEYS).and_then(details_of),
        dependencies: string_list_of(field(obj, DEPENDENCY_KEYS)),
        tools: string_list_of(field(obj, TOOL_KEYS)),
        example_query: field(obj, EXAMPLE_QUERY_KEYS).and_then(text_of),
    };

    let blank = record.label.is_empty()
        && record.priority.is_none()
        && record.details.is_none()
        && record.dependencies.is_empty()
        && record.tools.is_empty()
        && record.example_query.is_none();
    (!blank).then_some(record)
}

fn details_of(value: &Value) -> Option<ActionDetails> {
    match value {
        Value::Array(_) => non_empty(prose_list(Some(value))).map(ActionDetails::List),
        other => prose_of(other).map(ActionDetails::Prose),
    }
}

pub fn normalize_risks(raw: Option<&Value>, config: &ExtractionConfig) -> Option<Risks> {
    match resolve(SlotKind::Risks, raw, config) {
        Resolved::Absent => None,
        Resolved::Prose(text) => Some(Risks::Strings(vec![text])),
        Resolved::Value { value, narrative } => {
            risks_from_value(&value).or_else(|| narrative.map(|text| Risks::Strings(vec![text])))
        }
    }
}

fn risks_from_value(value: &Value) -> Option<Risks> {
    match value {
        Value::Array(items) => risks_from_array(items),
        Value::Object(obj) => promote(SlotKind::Risks, obj)
            .and_then(Value::as_array)
            .and_then(|items| risks_from_array(items))
            .or_else(|| {
                SlotKind::Risks
                    .matches_record(obj)
                    .then(|| risk_record(obj))
                    .flatten()
                    .map(|record| Risks::Records(vec![record]))
            }),
        _ => None,
    }
}

fn risks_from_array(items: &[Value]) -> Option<Risks> {
    if items.first()?.is_object() {
        let records: Vec<RiskRecord> = items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(risk_record)
            .collect();
        non_empty(records).map(Risks::Records)
    } else {
        non_empty(string_list(items)).map(Risks::Strings)
    }
}

fn risk_record(obj: &Map<String, Value>) -> Option<RiskRecord> {
    let record = RiskRecord {
        label: field(obj, RISK_LABEL_KEYS)
            .and_then(text_of)
            .unwrap_or_default(),
        cause: field(obj, CAUSE_KEYS).and_then(prose_of),
        impact: field(obj, IMPACT_KEYS).and_then(prose_of),
        mitigation: field(obj, MITIGATION_KEYS).and_then(prose_of),
    };

    let blank = record.label.is_empty()
        && record.cause.is_none()
        && record.impact.is_none()
        && record.mitigation.is_none();
    (!blank).then_some(record)
}

pub fn normalize_suggested_queries(
    raw: Option<&Value>,
    config: &ExtractionConfig,
) -> Option<SuggestedQueries> {
    match resolve(SlotKind::SuggestedQueries, raw, config) {
        Resolved::Absent => None,
        Resolved::Prose(text) => Some(SuggestedQueries::Single(strip_fences(&text))),
        Resolved::Value { value, narrative } => queries_from_value(&value)
            .or_else(|| narrative.map(|text| SuggestedQueries::Single(strip_fences(&text)))),
    }
}

fn queries_from_value(value: &Value) -> Option<SuggestedQueries> {
    match value {
        Value::Array(items) => queries_from_array(items),
        Value::Object(obj) => promote(SlotKind::SuggestedQueries, obj)
            .and_then(Value::as_array)
            .and_then(|items| queries_from_array(items))
            .or_else(|| query_entry(obj).map(|entry| SuggestedQueries::List(vec![entry]))),
        _ => None,
    }
}

fn queries_from_array(items: &[Value]) -> Option<SuggestedQueries> {
    let entries: Vec<QueryEntry> = if items.first()?.is_object() {
        items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(query_entry)
            .collect()
    } else {
        string_list(items)
            .into_iter()
            .map(|query| QueryEntry {
                description: None,
                query,
            })
            .collect()
    };
    non_empty(entries).map(SuggestedQueries::List)
}

fn query_entry(obj: &Map<String, Value>) -> Option<QueryEntry> {
    let query = field(obj, QUERY_KEYS).and_then(text_of)?;
    Some(QueryEntry {
        description: field(obj, DESCRIPTION_KEYS).and_then(text_of),
        query: strip_fences(&query),
    })
}

pub fn normalize_notes(raw: Option<&Value>, config: &ExtractionConfig) -> Option<Notes> {
    let value = match resolve(SlotKind::Notes, raw, config) {
        Resolved::Value { value, .. } => value,
        Resolved::Prose(_) => {
            log::debug!("notes: prose has no canonical shape, dropping");
            return None;
        }
        Resolved::Absent => return None,
    };

    let record = record_or_promoted(SlotKind::Notes, value.as_object()?)?;
    let notes = Notes {
        recommended_tools: string_list_of(field(record, RECOMMENDED_TOOLS_KEYS)),
        best_practices: string_list_of(field(record, BEST_PRACTICES_KEYS)),
    };
    if notes.recommended_tools.is_empty() && notes.best_practices.is_empty() {
        None
    } else {
        Some(notes)
    }
}

// =============================================================================
// Value helpers
// =============================================================================

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

/// Display text of a scalar-ish value. Objects carrying a `text` string
/// (already-rendered prose) yield that string.
fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(obj) => match obj.get("text") {
            Some(Value::String(s)) => s.trim().to_string(),
            _ => value.to_string(),
        },
        Value::Array(_) => value.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Prose for a narrative field. Structured values are wrapped in a `json`
/// fence so display rendering pretty-prints them.
fn prose_of(value: &Value) -> Option<Prose> {
    let structured = match value {
        Value::Object(obj) => !matches!(obj.get("text"), Some(Value::String(_))),
        Value::Array(_) => true,
        _ => false,
    };
    if structured {
        let body = serde_json::to_string_pretty(value).ok()?;
        return Some(Prose::raw(format!("```json\n{}\n```", body)));
    }
    text_of(value).map(Prose::raw)
}

fn prose_list(value: Option<&Value>) -> Vec<Prose> {
    match value {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(prose_of).collect(),
        Some(other) => prose_of(other).into_iter().collect(),
    }
}

fn string_list(items: &[Value]) -> Vec<String> {
    items.iter().filter_map(text_of).collect()
}

fn string_list_of(value: Option<&Value>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(Value::Array(items)) => string_list(items),
        Some(other) => text_of(other).into_iter().collect(),
    }
}

/// Fenced text reduced to its segment contents, delimiters removed.
fn strip_fences(text: &str) -> String {
    if !text.contains("```") {
        return text.to_string();
    }
    let segments = fence::scan(text);
    if segments.is_empty() {
        return text.to_string();
    }
    segments
        .iter()
        .map(|seg| seg.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cfg() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    fn text(p: &Prose) -> &str {
        &p.text
    }

    #[test]
    fn test_actions_fenced_json_string_with_french_priority() {
        let raw = json!("```json\n[{\"action\":\"Add index\",\"priorite\":\"haute\"}]\n```");
        let actions = normalize_actions(Some(&raw), &cfg()).expect("actions");

        let Actions::Records(records) = actions else {
            panic!("expected records, got {actions:?}");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "Add index");
        assert_eq!(records[0].priority, Some(Priority::High));
        assert!(records[0].details.is_none());
    }

    #[test]
    fn test_empty_risk_list_is_absent() {
        assert_eq!(normalize_risks(Some(&json!([])), &cfg()), None);
        assert_eq!(normalize_actions(Some(&json!([])), &cfg()), None);
        assert_eq!(normalize_suggested_queries(Some(&json!([])), &cfg()), None);
    }

    #[test]
    fn test_diagnostic_raw_json_string() {
        let raw = json!("{\"etat_actuel\": \"DB fragmented\"}");
        let diagnostic = normalize_diagnostic(Some(&raw), &cfg()).expect("diagnostic");

        let Diagnostic::Structured(d) = diagnostic else {
            panic!("expected structured diagnostic");
        };
        assert_eq!(d.current_state.as_ref().map(text), Some("DB fragmented"));
        assert!(d.hypotheses.is_empty());
        assert!(d.preliminary_checks.is_empty());
    }

    #[test]
    fn test_actions_promoted_from_wrapper_property() {
        let raw = json!("{\"data\": [\"Vacuum\", \"Reindex\"]}");
        let actions = normalize_actions(Some(&raw), &cfg());
        assert_eq!(
            actions,
            Some(Actions::Strings(vec!["Vacuum".to_string(), "Reindex".to_string()]))
        );
    }

    #[test]
    fn test_promotion_picks_first_matching_property() {
        let raw = json!({
            "meta": {"model": "x"},
            "empty": [],
            "primary": [{"risque": "Lock contention"}],
            "secondary": [{"risque": "Disk full"}]
        });
        let Some(Risks::Records(records)) = normalize_risks(Some(&raw), &cfg()) else {
            panic!("expected risk records");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "Lock contention");
    }

    #[test]
    fn test_empty_object_string_is_absent_everywhere() {
        let raw = json!("{}");
        assert_eq!(normalize_diagnostic(Some(&raw), &cfg()), None);
        assert_eq!(normalize_actions(Some(&raw), &cfg()), None);
        assert_eq!(normalize_risks(Some(&raw), &cfg()), None);
        assert_eq!(normalize_suggested_queries(Some(&raw), &cfg()), None);
        assert_eq!(normalize_notes(Some(&raw), &cfg()), None);
    }

    #[test]
    fn test_absent_null_blank_and_scalars() {
        let inputs = [
            None,
            Some(json!(null)),
            Some(json!("   ")),
            Some(json!(3)),
            Some(json!(true)),
        ];
        for raw in inputs {
            assert_eq!(normalize_diagnostic(raw.as_ref(), &cfg()), None);
            assert_eq!(normalize_actions(raw.as_ref(), &cfg()), None);
            assert_eq!(normalize_risks(raw.as_ref(), &cfg()), None);
        }
    }

    #[test]
    fn test_first_element_decides_array_shape() {
        // A string first element makes the whole array a string list.
        let raw = json!(["Check autovacuum", {"action": "ignored as record"}]);
        let Some(Actions::Strings(items)) = normalize_actions(Some(&raw), &cfg()) else {
            panic!("expected strings");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], "Check autovacuum");
        assert_eq!(items[1], r#"{"action":"ignored as record"}"#);

        // An object first element drops later non-object elements.
        let raw = json!([{"action": "Reindex"}, "stray string"]);
        let Some(Actions::Records(records)) = normalize_actions(Some(&raw), &cfg()) else {
            panic!("expected records");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "Reindex");
    }

    #[test]
    fn test_canonical_action_records_are_unchanged() {
        let raw = json!([{
            "label": "Add index",
            "priority": "critical",
            "details": ["Target orders.customer_id", "Build concurrently"],
            "dependencies": ["Maintenance window"],
            "tools": ["psql"],
            "exampleQuery": "CREATE INDEX CONCURRENTLY idx ON orders(customer_id);"
        }]);
        let first = normalize_actions(Some(&raw), &cfg()).expect("actions");

        let Actions::Records(records) = &first else {
            panic!("expected records");
        };
        let record = &records[0];
        assert_eq!(record.label, "Add index");
        assert_eq!(record.priority, Some(Priority::Critical));
        let Some(ActionDetails::List(details)) = &record.details else {
            panic!("expected detail list");
        };
        assert_eq!(
            details.iter().map(text).collect::<Vec<_>>(),
            vec!["Target orders.customer_id", "Build concurrently"]
        );
        assert_eq!(record.dependencies, vec!["Maintenance window"]);
        assert_eq!(record.tools, vec!["psql"]);
        assert_eq!(
            record.example_query.as_deref(),
            Some("CREATE INDEX CONCURRENTLY idx ON orders(customer_id);")
        );

        // Feeding the serialized canonical records back gives the same records.
        let reserialized = serde_json::to_value(records).expect("serialize");
        assert_eq!(normalize_actions(Some(&reserialized), &cfg()), Some(first));
    }

    #[test]
    fn test_single_record_object_becomes_one_item_list() {
        let raw = json!({"risque": "Deadlocks", "cause": "Lock ordering", "impact": "Timeouts"});
        let Some(Risks::Records(records)) = normalize_risks(Some(&raw), &cfg()) else {
            panic!("expected records");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "Deadlocks");
        assert_eq!(records[0].cause.as_ref().map(text), Some("Lock ordering"));
        assert_eq!(records[0].impact.as_ref().map(text), Some("Timeouts"));
        assert!(records[0].mitigation.is_none());
    }

    #[test]
    fn test_plain_text_slots() {
        let raw = json!("Tables look bloated.");
        assert_eq!(
            normalize_diagnostic(Some(&raw), &cfg()),
            Some(Diagnostic::Prose(Prose::raw("Tables look bloated.")))
        );
        assert_eq!(
            normalize_actions(Some(&raw), &cfg()),
            Some(Actions::Strings(vec!["Tables look bloated.".to_string()]))
        );
        assert_eq!(normalize_notes(Some(&raw), &cfg()), None);
    }

    #[test]
    fn test_shapeless_embedded_json_keeps_narrative() {
        let raw = json!("Raise it: {\"shared_buffers\": \"4GB\"} then restart.");
        assert_eq!(
            normalize_diagnostic(Some(&raw), &cfg()),
            Some(Diagnostic::Prose(Prose::raw(
                "Raise it: {\"shared_buffers\": \"4GB\"} then restart."
            )))
        );
    }

    #[test]
    fn test_diagnostic_wrapped_one_level_deep() {
        let raw = json!({
            "analysis": {
                "current_state": "Healthy",
                "hypotheses": ["Cold cache", "Missing index"],
                "verifications_prealables": "Check pg_stat_statements"
            }
        });
        let Some(Diagnostic::Structured(d)) = normalize_diagnostic(Some(&raw), &cfg()) else {
            panic!("expected structured diagnostic");
        };
        assert_eq!(d.current_state.as_ref().map(text), Some("Healthy"));
        assert_eq!(d.hypotheses.len(), 2);
        assert_eq!(d.preliminary_checks.len(), 1);
        assert_eq!(text(&d.preliminary_checks[0]), "Check pg_stat_statements");
    }

    #[test]
    fn test_structured_prose_field_becomes_json_fence() {
        let raw = json!({"etat_actuel": {"tables": 12}});
        let Some(Diagnostic::Structured(d)) = normalize_diagnostic(Some(&raw), &cfg()) else {
            panic!("expected structured diagnostic");
        };
        assert_eq!(
            d.current_state.as_ref().map(text),
            Some("```json\n{\n  \"tables\": 12\n}\n```")
        );
    }

    #[test]
    fn test_diagnostic_array_is_absent() {
        assert_eq!(normalize_diagnostic(Some(&json!(["a", "b"])), &cfg()), None);
    }

    #[test]
    fn test_suggested_query_shapes() {
        let single = json!("```sql\nSELECT * FROM pg_stat_activity;\n```");
        assert_eq!(
            normalize_suggested_queries(Some(&single), &cfg()),
            Some(SuggestedQueries::Single(
                "SELECT * FROM pg_stat_activity;".to_string()
            ))
        );

        let list = json!([
            {"description": "Find bloat", "requete": "SELECT 1"},
            {"description": "No query here"},
            {"sql": "SELECT 2"}
        ]);
        assert_eq!(
            normalize_suggested_queries(Some(&list), &cfg()),
            Some(SuggestedQueries::List(vec![
                QueryEntry {
                    description: Some("Find bloat".to_string()),
                    query: "SELECT 1".to_string(),
                },
                QueryEntry {
                    description: None,
                    query: "SELECT 2".to_string(),
                },
            ]))
        );

        let strings = json!(["SELECT 3", ""]);
        assert_eq!(
            normalize_suggested_queries(Some(&strings), &cfg()),
            Some(SuggestedQueries::List(vec![QueryEntry {
                description: None,
                query: "SELECT 3".to_string(),
            }]))
        );
    }

    #[test]
    fn test_notes_french_keys_and_single_strings() {
        let raw = json!({
            "outils_recommandes": ["pg_repack", "pgBadger"],
            "bonnes_pratiques": "Schedule VACUUM ANALYZE"
        });
        assert_eq!(
            normalize_notes(Some(&raw), &cfg()),
            Some(Notes {
                recommended_tools: vec!["pg_repack".to_string(), "pgBadger".to_string()],
                best_practices: vec!["Schedule VACUUM ANALYZE".to_string()],
            })
        );
        assert_eq!(normalize_notes(Some(&json!({"other": 1})), &cfg()), None);
    }

    #[test]
    fn test_configured_priority_alias() {
        let mut config = cfg();
        config
            .priority_aliases
            .insert("asap".to_string(), Priority::Critical);
        let raw = json!([{"action": "Kill runaway query", "priority": "ASAP"}]);
        let Some(Actions::Records(records)) = normalize_actions(Some(&raw), &config) else {
            panic!("expected records");
        };
        assert_eq!(records[0].priority, Some(Priority::Critical));
    }

    #[test]
    fn test_double_encoded_json_string() {
        let inner = r#"[{"action": "Analyze"}]"#;
        let raw = Value::String(serde_json::to_string(inner).expect("encode"));
        let Some(Actions::Records(records)) = normalize_actions(Some(&raw), &cfg()) else {
            panic!("expected records");
        };
        assert_eq!(records[0].label, "Analyze");
    }

    #[test]
    fn test_titled_wrapper_promotes_action_list() {
        let raw = json!({
            "title": "Maintenance plan",
            "steps": [{"action": "Reindex"}, {"action": "Vacuum"}]
        });
        let Some(Actions::Records(records)) = normalize_actions(Some(&raw), &cfg()) else {
            panic!("expected records");
        };
        let labels: Vec<&str> = records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Reindex", "Vacuum"]);
    }

    #[test]
    fn test_described_wrapper_promotes_query_list() {
        let raw = json!({"description": "Useful queries", "queries": ["SELECT 1", "SELECT 2"]});
        let expected = ["SELECT 1", "SELECT 2"]
            .into_iter()
            .map(|query| QueryEntry {
                description: None,
                query: query.to_string(),
            })
            .collect();
        assert_eq!(
            normalize_suggested_queries(Some(&raw), &cfg()),
            Some(SuggestedQueries::List(expected))
        );
    }

    #[test]
    fn test_titled_wrapper_promotes_risk_list() {
        let raw = json!({"title": "Identified risks", "items": [{"risk": "Lock contention"}]});
        let Some(Risks::Records(records)) = normalize_risks(Some(&raw), &cfg()) else {
            panic!("expected records");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "Lock contention");
    }

    #[test]
    fn test_record_list_fields_are_not_promoted() {
        let raw = json!({
            "action": "Reindex orders",
            "tools": ["psql", "pg_repack"],
            "dependencies": ["Maintenance window"]
        });
        let Some(Actions::Records(records)) = normalize_actions(Some(&raw), &cfg()) else {
            panic!("expected records");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "Reindex orders");
        assert_eq!(records[0].tools, vec!["psql", "pg_repack"]);

        let raw = json!({
            "description": "Active sessions",
            "query": "SELECT * FROM pg_stat_activity"
        });
        assert_eq!(
            normalize_suggested_queries(Some(&raw), &cfg()),
            Some(SuggestedQueries::List(vec![QueryEntry {
                description: Some("Active sessions".to_string()),
                query: "SELECT * FROM pg_stat_activity".to_string(),
            }]))
        );
    }

    #[test]
    fn test_object_without_identifying_key_is_absent() {
        let raw = json!({"priority": "high", "details": "No label anywhere"});
        assert_eq!(normalize_actions(Some(&raw), &cfg()), None);
        assert_eq!(
            normalize_suggested_queries(Some(&json!({"description": "No query"})), &cfg()),
            None
        );
    }

    #[test]
    fn test_one_line_query_fence_keeps_whole_statement() {
        let raw = json!("```SELECT * FROM orders;```");
        assert_eq!(
            normalize_suggested_queries(Some(&raw), &cfg()),
            Some(SuggestedQueries::Single("SELECT * FROM orders;".to_string()))
        );
    }
}
