//! Adapter interfaces for external systems.
//!
//! The engine talks to the outside world through three seams: the
//! `Announcer` that delivers messages, the `ContentStore` that persists
//! state across restarts, and the `ChatHistory` source used for backfill
//! scanning. Each is a trait so producers and tests can swap
//! implementations.

pub mod discord;
pub mod file_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ContentRecord;

// Re-export the concrete adapters
pub use discord::{DiscordAnnouncer, DiscordConfig, DiscordHistory};
pub use file_store::FileStore;

/// Result of one announcement attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnounceResult {
    /// Delivery succeeded (or was deliberately suppressed)
    pub success: bool,

    /// The announcer itself chose not to send (operator kill-switch)
    pub skipped: bool,

    /// Why the announcer skipped, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Message id assigned by the chat service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Channel the message landed in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

impl AnnounceResult {
    /// A delivered announcement
    pub fn sent(message_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            success: true,
            skipped: false,
            reason: None,
            message_id: Some(message_id.into()),
            channel_id: Some(channel_id.into()),
        }
    }

    /// An operator-suppressed announcement
    pub fn suppressed(reason: impl Into<String>) -> Self {
        Self {
            success: true,
            skipped: true,
            reason: Some(reason.into()),
            message_id: None,
            channel_id: None,
        }
    }
}

/// Options for an announcement
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnounceOptions {
    /// Bypass operator kill-switches (not the coordinator's own gates)
    pub force: bool,
}

/// Delivers announcements to chat.
///
/// Message formatting, operator kill-switches and rate limiting all live
/// behind this trait; the coordinator only cares about the result.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(
        &self,
        record: &ContentRecord,
        options: AnnounceOptions,
    ) -> anyhow::Result<AnnounceResult>;
}

/// Errors from the persistent store
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write failed; the in-memory mirror stays authoritative but the
    /// durability guarantee is degraded until the next successful write.
    #[error("persistence degraded: {0}")]
    PersistenceDegraded(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Counts reported by the store for the stats surface
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageStats {
    pub content_states: usize,
    pub fingerprints: usize,
}

/// Durable key-value storage for content state and seen-fingerprints.
///
/// The state manager and duplicate detector are the sole writers; nothing
/// else touches these namespaces.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn store_content_state(&self, record: &ContentRecord) -> Result<(), StoreError>;

    async fn get_content_state(&self, id: &str) -> Result<Option<ContentRecord>, StoreError>;

    async fn get_all_content_states(&self) -> Result<Vec<ContentRecord>, StoreError>;

    async fn remove_content_states(&self, ids: &[String]) -> Result<(), StoreError>;

    async fn clear_all_content_states(&self) -> Result<(), StoreError>;

    async fn has_fingerprint(&self, url: &str) -> Result<bool, StoreError>;

    async fn store_fingerprint(&self, url: &str) -> Result<(), StoreError>;

    async fn storage_stats(&self) -> Result<StorageStats, StoreError>;
}

/// One historical chat message, as needed for backfill scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub posted_at: Option<DateTime<Utc>>,
}

/// Source of historical announcement messages
#[async_trait]
pub trait ChatHistory: Send + Sync {
    /// Yield up to `limit` recent messages from a channel, newest first
    async fn recent_messages(&self, channel: &str, limit: usize) -> anyhow::Result<Vec<ChatMessage>>;
}
