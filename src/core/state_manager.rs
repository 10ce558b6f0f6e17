//! Lifecycle records for every content item the engine has accepted.
//!
//! Reads are served from an in-memory mirror; every mutation is mirrored
//! to the persistent store best-effort. A store write failure degrades
//! durability for the current record but never fails the in-memory
//! operation — the mirror stays authoritative for the process lifetime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::adapters::ContentStore;
use crate::domain::{ContentRecord, ContentState};

/// In-memory mirror of content lifecycle records, backed by the store
pub struct ContentStateManager {
    store: Arc<dyn ContentStore>,
    records: RwLock<HashMap<String, ContentRecord>>,

    /// Once set, the coordinator's age gate becomes strict. Before that,
    /// sightings are treated permissively so startup backfill does not
    /// produce a flood of false "too old" skips.
    fully_initialized: AtomicBool,
}

impl ContentStateManager {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            records: RwLock::new(HashMap::new()),
            fully_initialized: AtomicBool::new(false),
        }
    }

    /// Seed the mirror from the store (call once at startup)
    pub async fn load(&self) -> anyhow::Result<usize> {
        let stored = self.store.get_all_content_states().await?;
        let count = stored.len();

        let mut records = self.records.write().await;
        for record in stored {
            records.insert(record.item.id.clone(), record);
        }

        info!(count, "Loaded content states from store");
        Ok(count)
    }

    pub async fn has_content(&self, id: &str) -> bool {
        self.records.read().await.contains_key(id)
    }

    /// Create or overwrite the stored record
    pub async fn add_content(&self, record: ContentRecord) {
        let id = record.item.id.clone();
        self.persist(&record).await;
        self.records.write().await.insert(id, record);
    }

    pub async fn get_content_state(&self, id: &str) -> Option<ContentRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// All records currently in a given state (used by schedule pollers)
    pub async fn get_content_by_state(&self, state: ContentState) -> Vec<ContentRecord> {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.state == state)
            .cloned()
            .collect()
    }

    /// Mutate a record in place, bump `updated_at`, mirror to the store.
    /// Returns the updated record, or None if the id is unknown.
    pub async fn update_content<F>(&self, id: &str, mutate: F) -> Option<ContentRecord>
    where
        F: FnOnce(&mut ContentRecord),
    {
        let updated = {
            let mut records = self.records.write().await;
            let record = records.get_mut(id)?;
            mutate(record);
            record.updated_at = Utc::now();
            record.clone()
        };

        self.persist(&updated).await;
        Some(updated)
    }

    /// Remove records older than the threshold and not in an active state.
    /// Returns how many were removed.
    pub async fn cleanup_old_states(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;

        let removed: Vec<String> = {
            let mut records = self.records.write().await;
            let stale: Vec<String> = records
                .values()
                .filter(|r| r.updated_at < cutoff && !r.state.is_active())
                .map(|r| r.item.id.clone())
                .collect();
            for id in &stale {
                records.remove(id);
            }
            stale
        };

        if !removed.is_empty() {
            if let Err(e) = self.store.remove_content_states(&removed).await {
                warn!(error = %e, count = removed.len(), "Failed to remove content states from store");
            }
            info!(count = removed.len(), "Cleaned up old content states");
        }

        removed.len()
    }

    /// Flip the readiness flag: startup backfill has completed and the
    /// age gate may become strict.
    pub fn mark_fully_initialized(&self) {
        self.fully_initialized.store(true, Ordering::SeqCst);
        debug!("Content state manager marked fully initialized");
    }

    pub fn is_fully_initialized(&self) -> bool {
        self.fully_initialized.load(Ordering::SeqCst)
    }

    /// Number of records currently tracked
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Best-effort mirror of a record to the store
    async fn persist(&self, record: &ContentRecord) {
        if let Err(e) = self.store.store_content_state(record).await {
            warn!(
                content_id = %record.item.id,
                error = %e,
                "Content state write failed; continuing with in-memory state only"
            );
        }
    }
}
