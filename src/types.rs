use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::advisory::Priority;

/// Configuration stored in ~/.dbadvisor/config.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

// =============================================================================
// Extraction Configuration
// =============================================================================

/// Tunables for the extraction engine.
///
/// Passed by reference through every engine call; nothing in the engine
/// reads configuration from anywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    /// Shortest embedded `{...}` / `[...]` span worth trying to parse.
    #[serde(default = "default_min_embedded_json_len")]
    pub min_embedded_json_len: usize,
    /// Confidence assigned when the response carries no usable number.
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,
    /// Extra priority words, matched case-insensitively before the built-ins.
    #[serde(default)]
    pub priority_aliases: BTreeMap<String, Priority>,
    /// Re-emit recovered JSON blocks pretty-printed (compact when false).
    #[serde(default = "default_pretty_json_blocks")]
    pub pretty_json_blocks: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_embedded_json_len: default_min_embedded_json_len(),
            fallback_confidence: default_fallback_confidence(),
            priority_aliases: BTreeMap::new(),
            pretty_json_blocks: default_pretty_json_blocks(),
        }
    }
}

fn default_min_embedded_json_len() -> usize {
    20
}

fn default_fallback_confidence() -> f64 {
    0.5
}

fn default_pretty_json_blocks() -> bool {
    true
}
