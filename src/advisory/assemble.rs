//! Final document assembly and prose rendering.

use serde_json::Value;

use super::document::{AdvisoryDocument, DisplaySegment, Prose};
use super::fence::{self, Segment, SegmentKind};
use super::normalize::{
    normalize_actions, normalize_diagnostic, normalize_notes, normalize_risks,
    normalize_suggested_queries,
};
use super::recover::{recover, RecoveryResult};
use crate::types::ExtractionConfig;

/// Build the canonical document from the six raw slot values.
///
/// Every prose field is rendered through [`render_prose`] before the
/// document is returned.
pub fn assemble(
    diagnostic: Option<&Value>,
    actions: Option<&Value>,
    risks: Option<&Value>,
    suggested_queries: Option<&Value>,
    confidence: f64,
    notes: Option<&Value>,
    config: &ExtractionConfig,
) -> AdvisoryDocument {
    let mut doc = AdvisoryDocument {
        diagnostic: normalize_diagnostic(diagnostic, config),
        actions: normalize_actions(actions, config),
        risks: normalize_risks(risks, config),
        suggested_queries: normalize_suggested_queries(suggested_queries, config),
        confidence,
        notes: normalize_notes(notes, config),
    };

    doc.for_each_prose_mut(&mut |prose| *prose = render_prose(&prose.text, config));

    if doc.has_content() {
        log::debug!(
            "Assembled advisory: diagnostic={} actions={} risks={} queries={} notes={}",
            doc.diagnostic.is_some(),
            doc.actions.is_some(),
            doc.risks.is_some(),
            doc.suggested_queries.is_some(),
            doc.notes.is_some()
        );
    } else {
        log::warn!(
            "Advisory response has no structured data (confidence {})",
            doc.confidence
        );
    }
    doc
}

/// Segment a narrative field for display.
///
/// JSON fences are replaced by the re-serialized value. A `json`-tagged
/// fence that does not parse keeps its inner text without delimiters.
/// Other code fences are kept as code.
pub fn render_prose(text: &str, config: &ExtractionConfig) -> Prose {
    let segments: Vec<DisplaySegment> = fence::scan(text)
        .into_iter()
        .map(|seg| display_segment(seg, config))
        .collect();

    let text = segments
        .iter()
        .map(segment_text)
        .collect::<Vec<_>>()
        .join("\n");

    Prose { text, segments }
}

fn display_segment(seg: Segment, config: &ExtractionConfig) -> DisplaySegment {
    if seg.kind == SegmentKind::Prose {
        return DisplaySegment::Text { text: seg.content };
    }
    if !seg.is_json_candidate() {
        return DisplaySegment::Code {
            language: seg.language,
            content: seg.content,
        };
    }

    match recover(&seg.content, config) {
        RecoveryResult::Recovered { value, .. } => DisplaySegment::Json {
            json: format_json(&value, config.pretty_json_blocks),
        },
        RecoveryResult::Unrecovered(inner) if seg.is_json_tagged() => {
            DisplaySegment::Text { text: inner }
        }
        RecoveryResult::Unrecovered(_) => DisplaySegment::Code {
            language: seg.language,
            content: seg.content,
        },
    }
}

fn format_json(value: &Value, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}

fn segment_text(seg: &DisplaySegment) -> String {
    match seg {
        DisplaySegment::Text { text } => text.clone(),
        DisplaySegment::Json { json } => json.clone(),
        DisplaySegment::Code { language, content } => format!(
            "```{}\n{}\n```",
            language.as_deref().unwrap_or_default(),
            content
        ),
    }
}
