//! Markdown fence scanner.
//!
//! Splits advisory text into ordered prose and fenced-code segments. Fences
//! are three backticks, an optional language tag ending the opening line,
//! and a closing three backticks. A word on a one-line fence is content, not
//! a tag. An opening fence with no closer is left as prose.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Whether a segment came from inside a fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Prose,
    Code,
}

/// One run of text produced by [`scan`], in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub kind: SegmentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub content: String,
    /// Byte offset of `content` in the scanned text.
    pub source_offset: usize,
}

impl Segment {
    pub fn is_code(&self) -> bool {
        self.kind == SegmentKind::Code
    }

    /// Fenced block tagged `json`, or untagged with a JSON-looking body.
    pub fn is_json_candidate(&self) -> bool {
        if !self.is_code() {
            return false;
        }
        match self.language.as_deref() {
            Some(lang) => lang.eq_ignore_ascii_case("json"),
            None => {
                let body = self.content.trim_start();
                body.starts_with('{') || body.starts_with('[')
            }
        }
    }

    /// Tagged `json` specifically (recovery strategy 2 ignores untagged fences).
    pub fn is_json_tagged(&self) -> bool {
        self.is_code()
            && self
                .language
                .as_deref()
                .is_some_and(|lang| lang.eq_ignore_ascii_case("json"))
    }
}

// Opening fence, optional `tag\n` opening line, lazy body, closing fence.
// Without a newline the tag group does not match and the body starts right
// after the backticks.
fn re_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:([A-Za-z0-9_+#.\-]*)[ \t]*\r?\n)?(.*?)```").unwrap()
    })
}

/// Scan `text` into ordered segments.
///
/// Whitespace-only prose between fences is dropped and prose runs are
/// trimmed. Code content keeps its leading indentation but loses trailing
/// blank lines.
pub fn scan(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let Some(caps) = re_fence().captures_at(text, cursor) else {
            break;
        };
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(2)) else {
            break;
        };

        push_prose(&mut segments, text, cursor, whole.start());

        let language = caps
            .get(1)
            .map(|m| m.as_str())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string);

        segments.push(Segment {
            kind: SegmentKind::Code,
            language,
            content: body.as_str().trim_end().to_string(),
            source_offset: body.start(),
        });

        // Never revisit consumed input, even if a later fence could overlap.
        cursor = whole.end();
    }

    push_prose(&mut segments, text, cursor, text.len());
    segments
}

fn push_prose(segments: &mut Vec<Segment>, text: &str, start: usize, end: usize) {
    if start >= end {
        return;
    }
    let slice = &text[start..end];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    let leading = slice.len() - slice.trim_start().len();
    segments.push(Segment {
        kind: SegmentKind::Prose,
        language: None,
        content: trimmed.to_string(),
        source_offset: start + leading,
    });
}
