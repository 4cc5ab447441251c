//! Advisory extraction engine.
//!
//! Raw model text flows one way: `fence` (segments) → `recover` (JSON) →
//! `normalize` (per-slot shapes) → `assemble` (document). `payload` reads a
//! whole response into the six raw fields first; `prompts` builds the
//! request that asks the model for that payload.

pub mod assemble;
pub mod document;
pub mod envelope;
pub mod fence;
pub mod normalize;
pub mod payload;
pub mod prompts;
pub mod recover;

pub use assemble::{assemble, render_prose};
pub use document::*;
pub use envelope::AdvisoryEnvelope;
pub use fence::{scan, Segment, SegmentKind};
pub use normalize::SlotKind;
pub use payload::{extract_advisory, parse_advisor_response, RawAdvisoryPayload};
pub use prompts::{build_advisor_prompt, DbContext};
pub use recover::{recover, RecoveryResult, RecoveryStrategy};

use serde_json::{Map, Value};

/// First present, non-null value among `aliases`, checked in alias order.
pub(crate) fn field<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
}
