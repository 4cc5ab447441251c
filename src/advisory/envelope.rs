use chrono::Utc;
use serde::Serialize;

use super::document::AdvisoryDocument;
use crate::error::{AdvisorError, ErrorInfo};

/// Response envelope handed to presentation.
///
/// `has_content` is false for a successful but structurally empty
/// advisory, which callers surface as "no structured data".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<AdvisoryDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub has_content: bool,
    pub generated_at: String,
}

impl AdvisoryEnvelope {
    pub fn success(advice: AdvisoryDocument) -> Self {
        Self {
            success: true,
            has_content: advice.has_content(),
            advice: Some(advice),
            error: None,
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn failure(err: &AdvisorError) -> Self {
        Self {
            success: false,
            advice: None,
            error: Some(ErrorInfo::from(err)),
            has_content: false,
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}
