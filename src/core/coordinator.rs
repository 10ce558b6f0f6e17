//! The content coordinator: exactly-once announcement decisions.
//!
//! Producers (webhook handlers, pollers, scrapers) all funnel raw
//! "content seen" events through `process_content`. Each call runs inside
//! a per-id critical section; same-id calls serialize and re-evaluate the
//! dedup gates, which is what makes a racing second source observe
//! `already_announced` instead of re-announcing. Distinct ids never wait
//! on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{instrument, warn};

use crate::adapters::{AnnounceOptions, Announcer};
use crate::domain::{ContentItem, ContentRecord, ContentState, ProcessingResult, Source};

use super::dedup::DuplicateDetector;
use super::observer::EngineObserver;
use super::state_manager::ContentStateManager;

/// Tunables for the coordinator's gates
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Age past which inactive records are garbage-collected
    pub max_content_age: Duration,

    /// Grace subtracted from the bot start time for the age gate, so
    /// items published moments before startup are still announced
    pub init_grace: Duration,

    /// How long after startup the age gate stays permissive even if
    /// nobody called `mark_fully_initialized`
    pub init_window: Duration,

    /// Operator override: announce items older than the start time
    pub announce_old_content: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_content_age: Duration::hours(24 * 7),
            init_grace: Duration::seconds(300),
            init_window: Duration::seconds(120),
            announce_old_content: false,
        }
    }
}

/// Orchestrates dedup, state and announcement for every sighting
pub struct ContentCoordinator {
    state: Arc<ContentStateManager>,
    dedup: Arc<DuplicateDetector>,
    announcer: Arc<dyn Announcer>,
    observer: Arc<dyn EngineObserver>,
    settings: EngineSettings,

    /// When this process started; the reference point for the age gate
    started_at: DateTime<Utc>,

    /// Per-content-id critical sections. Entries are removed once their
    /// chain drains so the map is bounded by active concurrency, not by
    /// total historical ids.
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ContentCoordinator {
    pub fn new(
        state: Arc<ContentStateManager>,
        dedup: Arc<DuplicateDetector>,
        announcer: Arc<dyn Announcer>,
        observer: Arc<dyn EngineObserver>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            state,
            dedup,
            announcer,
            observer,
            settings,
            started_at: Utc::now(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Process one sighting with default announce options
    pub async fn process_content(
        &self,
        content_id: &str,
        source: Source,
        item: ContentItem,
    ) -> ProcessingResult {
        self.process_content_with_options(content_id, source, item, AnnounceOptions::default())
            .await
    }

    /// Process one sighting. Never returns an error: business outcomes
    /// (duplicate, too old, already announced) are `Skip` results and
    /// announcer failures are `Failed` results.
    #[instrument(skip(self, item, options))]
    pub async fn process_content_with_options(
        &self,
        content_id: &str,
        source: Source,
        item: ContentItem,
        options: AnnounceOptions,
    ) -> ProcessingResult {
        // Validation has no side effects, so it runs outside the lock
        if let Some(reason) = Self::validate(content_id, &item) {
            let result = ProcessingResult::failed(content_id, source, reason);
            self.observer.on_processed(&result);
            return result;
        }

        let key_lock = self.acquire_key(content_id);
        let guard = key_lock.lock().await;

        let result = self.process_locked(content_id, source, item, options).await;

        drop(guard);
        drop(key_lock);
        self.release_key(content_id);

        self.observer.on_processed(&result);
        result
    }

    /// The gate sequence, run while holding the id's critical section
    async fn process_locked(
        &self,
        content_id: &str,
        source: Source,
        item: ContentItem,
        options: AnnounceOptions,
    ) -> ProcessingResult {
        // A slower source losing the race for a tracked id lands here.
        // This check runs before the fingerprint check so same-id repeats
        // report already_announced rather than duplicate_detected.
        let tracked = match self.state.get_content_state(content_id).await {
            Some(existing) if existing.announced => {
                return ProcessingResult::skip(content_id, source, "already_announced");
            }
            Some(_) => true,
            None => false,
        };

        // Fingerprint set: catches re-sightings across restarts and ids
        // whose canonical URLs coincide
        if self.dedup.is_duplicate(&item.url).await {
            return ProcessingResult::skip(content_id, source, "duplicate_detected");
        }

        // Age gate: only untracked items, only once startup is settled
        if !tracked && self.age_gate_strict() && self.is_too_old(&item) {
            return ProcessingResult::skip(content_id, source, "content_too_old");
        }

        // Register or refresh the record
        let record = if tracked {
            let updated = self
                .state
                .update_content(content_id, |r| {
                    r.source = source;
                    r.item.metadata.extend(item.metadata.clone());
                })
                .await;
            match updated {
                Some(r) => r,
                // Record vanished between the check and the update (cleanup
                // race); re-register it.
                None => self.register(item, source).await,
            }
        } else {
            self.register(item, source).await
        };

        // Hand off to the announcer and finalize
        match self.announcer.announce(&record, options).await {
            Ok(announcement) => {
                let now = Utc::now();
                self.state
                    .update_content(content_id, |r| {
                        r.announced = true;
                        r.announced_at = Some(now);
                        if !r.item.kind.is_broadcast() {
                            r.state = ContentState::Announced;
                        }
                    })
                    .await;
                self.dedup.mark_as_seen(&record.item.url).await;

                ProcessingResult::announced(content_id, source, announcement)
            }
            Err(e) => {
                // Leave the record un-announced so a legitimate retry is
                // not blocked by the already_announced gate.
                warn!(content_id, error = %e, "Announcement failed");
                ProcessingResult::failed(content_id, source, e.to_string())
            }
        }
    }

    async fn register(&self, item: ContentItem, source: Source) -> ContentRecord {
        let record = ContentRecord::new(item, source);
        self.state.add_content(record.clone()).await;
        record
    }

    /// Required-field checks; a failure names the missing field
    fn validate(content_id: &str, item: &ContentItem) -> Option<String> {
        if item.id.trim().is_empty() {
            return Some("missing_content_id".to_string());
        }
        if item.url.trim().is_empty() {
            return Some("missing_url".to_string());
        }
        if item.id != content_id {
            return Some(format!(
                "content_id_mismatch: argument '{}' vs payload '{}'",
                content_id, item.id
            ));
        }
        None
    }

    /// The age gate is permissive until backfill has settled: either the
    /// state manager was marked fully initialized, or the startup window
    /// has elapsed.
    fn age_gate_strict(&self) -> bool {
        self.state.is_fully_initialized() || Utc::now() >= self.started_at + self.settings.init_window
    }

    fn is_too_old(&self, item: &ContentItem) -> bool {
        if self.settings.announce_old_content {
            return false;
        }
        match item.published_at {
            Some(published) => published < self.started_at - self.settings.init_grace,
            None => false,
        }
    }

    fn acquire_key(&self, content_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("lock map poisoned");
        locks
            .entry(content_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Drop the map entry once no caller holds a clone of it
    fn release_key(&self, content_id: &str) {
        let mut locks = self.locks.lock().expect("lock map poisoned");
        if let Some(entry) = locks.get(content_id) {
            if Arc::strong_count(entry) == 1 {
                locks.remove(content_id);
            }
        }
    }

    /// Startup backfill has completed; the age gate becomes strict
    pub fn mark_fully_initialized(&self) {
        self.state.mark_fully_initialized();
    }

    /// Number of per-id critical sections currently held or queued
    pub fn active_locks(&self) -> usize {
        self.locks.lock().expect("lock map poisoned").len()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
