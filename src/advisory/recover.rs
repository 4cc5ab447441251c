//! Layered JSON recovery for model output.
//!
//! Strategies run in a fixed order and the first successful parse wins:
//!
//! 1. Direct parse of the trimmed candidate.
//! 2. The first ```` ```json ```` fence whose body parses.
//! 3. Object patterns, then array patterns. For each shape the anchored
//!    whole-string span is tried before the embedded span (first opener to
//!    last closer, then the first balanced span from the same opener).
//!    Spans shorter than `min_embedded_json_len` are skipped.
//! 4. Candidates whose outer non-whitespace characters are a matching
//!    bracket pair: parse as-is, then trimmed.
//!
//! A value is only ever produced by `serde_json` parsing some substring of
//! the input, so recovery never invents structure.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::fence;
use crate::types::ExtractionConfig;

/// Which strategy produced a recovered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    Direct,
    JsonFence,
    EmbeddedObject,
    EmbeddedArray,
    Delimited,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryResult {
    Recovered {
        value: Value,
        strategy: RecoveryStrategy,
    },
    Unrecovered(String),
}

impl RecoveryResult {
    pub fn into_value(self) -> Option<Value> {
        match self {
            RecoveryResult::Recovered { value, .. } => Some(value),
            RecoveryResult::Unrecovered(_) => None,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, RecoveryResult::Recovered { .. })
    }
}

#[derive(Clone, Copy)]
enum Shape {
    Object,
    Array,
}

impl Shape {
    fn delimiters(self) -> (char, char) {
        match self {
            Shape::Object => ('{', '}'),
            Shape::Array => ('[', ']'),
        }
    }

    fn strategy(self) -> RecoveryStrategy {
        match self {
            Shape::Object => RecoveryStrategy::EmbeddedObject,
            Shape::Array => RecoveryStrategy::EmbeddedArray,
        }
    }

    fn anchored(self) -> &'static Regex {
        match self {
            Shape::Object => re_anchored_object(),
            Shape::Array => re_anchored_array(),
        }
    }

    fn embedded(self) -> &'static Regex {
        match self {
            Shape::Object => re_embedded_object(),
            Shape::Array => re_embedded_array(),
        }
    }
}

fn re_anchored_object() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^\s*(\{.*\})\s*$").unwrap())
}

fn re_anchored_array() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^\s*(\[.*\])\s*$").unwrap())
}

fn re_embedded_object() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").unwrap())
}

fn re_embedded_array() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").unwrap())
}

/// Try every strategy in order against `candidate`.
pub fn recover(candidate: &str, config: &ExtractionConfig) -> RecoveryResult {
    let attempt = try_direct(candidate)
        .or_else(|| try_json_fences(candidate))
        .or_else(|| try_patterns(candidate, config.min_embedded_json_len))
        // Last-resort bracket-pair parse, kept as the fourth step of the
        // ladder. `serde_json` already skips surrounding whitespace, so any
        // input it accepts has been parsed by `try_direct`; it never fires
        // on its own today.
        .or_else(|| try_delimited(candidate));

    match attempt {
        Some((value, strategy)) => {
            log::debug!("Recovered JSON via {:?} ({} chars)", strategy, candidate.len());
            RecoveryResult::Recovered { value, strategy }
        }
        None => RecoveryResult::Unrecovered(candidate.to_string()),
    }
}

fn parse(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

fn try_direct(candidate: &str) -> Option<(Value, RecoveryStrategy)> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse(trimmed).map(|v| (v, RecoveryStrategy::Direct))
}

fn try_json_fences(candidate: &str) -> Option<(Value, RecoveryStrategy)> {
    if !candidate.contains("```") {
        return None;
    }
    fence::scan(candidate)
        .iter()
        .filter(|seg| seg.is_json_tagged())
        .find_map(|seg| parse(&seg.content))
        .map(|v| (v, RecoveryStrategy::JsonFence))
}

fn try_patterns(candidate: &str, min_len: usize) -> Option<(Value, RecoveryStrategy)> {
    for shape in [Shape::Object, Shape::Array] {
        if let Some(span) = shape
            .anchored()
            .captures(candidate)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
        {
            if span.len() >= min_len {
                if let Some(v) = parse(span) {
                    return Some((v, shape.strategy()));
                }
            }
        }

        if let Some(m) = shape.embedded().find(candidate) {
            let greedy = m.as_str();
            if greedy.len() >= min_len {
                if let Some(v) = parse(greedy) {
                    return Some((v, shape.strategy()));
                }
            }

            let (open, close) = shape.delimiters();
            if let Some(balanced) = balanced_span(&candidate[m.start()..], open, close) {
                if balanced.len() >= min_len && balanced.len() < greedy.len() {
                    if let Some(v) = parse(balanced) {
                        return Some((v, shape.strategy()));
                    }
                }
            }
        }
    }
    None
}

fn try_delimited(candidate: &str) -> Option<(Value, RecoveryStrategy)> {
    let trimmed = candidate.trim();
    let (Some(first), Some(last)) = (trimmed.chars().next(), trimmed.chars().last()) else {
        return None;
    };
    if !matches!((first, last), ('{', '}') | ('[', ']')) {
        return None;
    }
    parse(candidate)
        .or_else(|| parse(trimmed))
        .map(|v| (v, RecoveryStrategy::Delimited))
}

/// The first complete `open ... close` span at the start of `text`,
/// skipping delimiters inside string literals.
fn balanced_span(text: &str, open: char, close: char) -> Option<&str> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (i, ch) in text.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if ch == '\\' && in_string {
            escape = true;
            continue;
        }
        if ch == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return Some(&text[..i + ch.len_utf8()]);
            }
        }
    }
    None
}
