//! Degraded-store behavior.
//!
//! The in-memory mirrors are authoritative: a store whose writes fail
//! degrades durability, never correctness. State updates, dedup decisions
//! and announcements must all keep working for the process lifetime.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use herald::{
    AnnounceOptions, AnnounceResult, Announcer, ContentCoordinator, ContentItem, ContentKind,
    ContentRecord, ContentStateManager, ContentStore, DuplicateDetector, EngineSettings, Platform,
    ProcessingAction, Source, StorageStats, StoreError,
};

/// Store whose writes always fail; reads answer as if empty
struct FailingStore;

fn degraded() -> StoreError {
    StoreError::PersistenceDegraded("disk full".to_string())
}

#[async_trait]
impl ContentStore for FailingStore {
    async fn store_content_state(&self, _record: &ContentRecord) -> Result<(), StoreError> {
        Err(degraded())
    }

    async fn get_content_state(&self, _id: &str) -> Result<Option<ContentRecord>, StoreError> {
        Ok(None)
    }

    async fn get_all_content_states(&self) -> Result<Vec<ContentRecord>, StoreError> {
        Ok(Vec::new())
    }

    async fn remove_content_states(&self, _ids: &[String]) -> Result<(), StoreError> {
        Err(degraded())
    }

    async fn clear_all_content_states(&self) -> Result<(), StoreError> {
        Err(degraded())
    }

    async fn has_fingerprint(&self, _url: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn store_fingerprint(&self, _url: &str) -> Result<(), StoreError> {
        Err(degraded())
    }

    async fn storage_stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            content_states: 0,
            fingerprints: 0,
        })
    }
}

struct OkAnnouncer;

#[async_trait]
impl Announcer for OkAnnouncer {
    async fn announce(
        &self,
        _record: &ContentRecord,
        _options: AnnounceOptions,
    ) -> anyhow::Result<AnnounceResult> {
        Ok(AnnounceResult::sent("m1", "c1"))
    }
}

fn video(id: &str) -> ContentItem {
    ContentItem::new(
        id,
        Platform::Youtube,
        ContentKind::Video,
        format!("https://www.youtube.com/watch?v={}", id),
    )
    .with_published_at(Utc::now())
}

#[tokio::test]
async fn test_state_manager_survives_failing_writes() {
    let manager = ContentStateManager::new(Arc::new(FailingStore));
    assert!(manager.is_empty().await);

    manager
        .add_content(ContentRecord::new(video("v1"), Source::Webhook))
        .await;
    assert!(manager.has_content("v1").await);
    assert_eq!(manager.len().await, 1);

    let updated = manager
        .update_content("v1", |r| r.announced = true)
        .await
        .unwrap();
    assert!(updated.announced);
    assert!(manager.get_content_state("v1").await.unwrap().announced);
}

#[tokio::test]
async fn test_dedup_survives_failing_writes() {
    let detector = DuplicateDetector::new(Arc::new(FailingStore));

    detector
        .mark_as_seen("https://www.youtube.com/watch?v=v1")
        .await;
    assert!(
        detector
            .is_duplicate("https://www.youtube.com/watch?v=v1")
            .await
    );
    assert_eq!(detector.stats().await.seen_count, 1);
}

#[tokio::test]
async fn test_coordinator_announces_despite_failing_store() {
    let store = Arc::new(FailingStore);
    let state = Arc::new(ContentStateManager::new(store.clone()));
    let dedup = Arc::new(DuplicateDetector::new(store));
    let coordinator = ContentCoordinator::new(
        state,
        dedup,
        Arc::new(OkAnnouncer),
        Arc::new(herald::core::TracingObserver),
        EngineSettings::default(),
    );

    let first = coordinator
        .process_content("v1", Source::Webhook, video("v1"))
        .await;
    assert_eq!(first.action, ProcessingAction::Announced);

    // In-process exactly-once still holds off the in-memory mirrors
    let second = coordinator
        .process_content("v1", Source::Scraper, video("v1"))
        .await;
    assert_eq!(second.action, ProcessingAction::Skip);
    assert_eq!(second.reason.as_deref(), Some("already_announced"));
}
