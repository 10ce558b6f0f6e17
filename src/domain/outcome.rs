//! Structured results returned to producers.
//!
//! Business outcomes (duplicate, too old, already announced) are not
//! errors; producers always receive a `ProcessingResult` and log it.

use serde::{Deserialize, Serialize};

use crate::adapters::AnnounceResult;

use super::content::Source;

/// What the coordinator decided to do with a sighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingAction {
    /// The item passed all gates and the announcer was invoked
    Announced,

    /// Deliberate no-op (duplicate, already announced, too old)
    Skip,

    /// Validation or delivery failure
    Failed,
}

/// Result of one `process_content` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// The decision
    pub action: ProcessingAction,

    /// Content id the call was about
    pub content_id: String,

    /// Producer that made the call
    pub source: Source,

    /// Machine-readable reason for skips and failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// The announcer's own result, passed through unchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement: Option<AnnounceResult>,
}

impl ProcessingResult {
    pub fn announced(content_id: impl Into<String>, source: Source, announcement: AnnounceResult) -> Self {
        Self {
            action: ProcessingAction::Announced,
            content_id: content_id.into(),
            source,
            reason: None,
            announcement: Some(announcement),
        }
    }

    pub fn skip(content_id: impl Into<String>, source: Source, reason: impl Into<String>) -> Self {
        Self {
            action: ProcessingAction::Skip,
            content_id: content_id.into(),
            source,
            reason: Some(reason.into()),
            announcement: None,
        }
    }

    pub fn failed(content_id: impl Into<String>, source: Source, reason: impl Into<String>) -> Self {
        Self {
            action: ProcessingAction::Failed,
            content_id: content_id.into(),
            source,
            reason: Some(reason.into()),
            announcement: None,
        }
    }

    /// True when the item was handed to the announcer
    pub fn is_announced(&self) -> bool {
        self.action == ProcessingAction::Announced
    }
}
