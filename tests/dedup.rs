//! Duplicate detector integration tests.
//!
//! Covers dedup soundness, restart behavior through the store, and the
//! chat-history backfill scan.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;

use herald::{ChatHistory, ChatMessage, DuplicateDetector, FileStore};

/// Fixed in-memory history source
struct FixedHistory {
    messages: Vec<ChatMessage>,
}

impl FixedHistory {
    fn new(texts: &[&str]) -> Self {
        Self {
            messages: texts
                .iter()
                .enumerate()
                .map(|(i, text)| ChatMessage {
                    id: format!("msg{}", i),
                    text: (*text).to_string(),
                    posted_at: Some(Utc::now()),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ChatHistory for FixedHistory {
    async fn recent_messages(&self, _channel: &str, limit: usize) -> anyhow::Result<Vec<ChatMessage>> {
        Ok(self.messages.iter().take(limit).cloned().collect())
    }
}

async fn create_detector() -> (DuplicateDetector, Arc<FileStore>, TempDir) {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::open(temp.path()).await.unwrap());
    (DuplicateDetector::new(store.clone()), store, temp)
}

#[tokio::test]
async fn test_dedup_soundness() {
    let (detector, _store, _temp) = create_detector().await;
    let url = "https://www.youtube.com/watch?v=abc123def45";

    assert!(!detector.is_duplicate(url).await);
    detector.mark_as_seen(url).await;
    assert!(detector.is_duplicate(url).await);

    let stats = detector.stats().await;
    assert_eq!(stats.seen_count, 1);
}

#[tokio::test]
async fn test_restart_sees_previous_fingerprints() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::open(temp.path()).await.unwrap());

    {
        let detector = DuplicateDetector::new(store.clone());
        detector
            .mark_as_seen("https://x.com/i/status/42")
            .await;
    }

    // A fresh detector over the same store files (a "restarted process")
    let detector = DuplicateDetector::new(store);
    assert!(detector.is_duplicate("https://x.com/i/status/42").await);
}

#[tokio::test]
async fn test_backfill_scan_seeds_set() {
    let (detector, _store, _temp) = create_detector().await;

    let history = FixedHistory::new(&[
        "📺 New video: https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "🐦 https://x.com/someone/status/1234567890",
        "no links in this one",
        "short link https://youtu.be/jNQXAC9IVRw go watch",
    ]);

    let report = detector
        .scan_channel_history(&history, "chan1", 1000)
        .await
        .unwrap();

    assert_eq!(report.messages_scanned, 4);
    assert_eq!(report.ids_added, 3);
    assert!(report.errors.is_empty());

    assert!(
        detector
            .is_duplicate("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await
    );
    assert!(detector.is_duplicate("https://x.com/i/status/1234567890").await);
    assert!(
        detector
            .is_duplicate("https://www.youtube.com/watch?v=jNQXAC9IVRw")
            .await
    );
}

#[tokio::test]
async fn test_backfill_scan_is_idempotent() {
    let (detector, _store, _temp) = create_detector().await;

    let history = FixedHistory::new(&[
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://x.com/a/status/111 and https://x.com/b/status/222",
    ]);

    let first = detector
        .scan_channel_history(&history, "chan1", 1000)
        .await
        .unwrap();
    assert_eq!(first.ids_added, 3);

    let second = detector
        .scan_channel_history(&history, "chan1", 1000)
        .await
        .unwrap();
    assert_eq!(second.ids_added, 0);
    assert_eq!(second.messages_scanned, 2);

    assert_eq!(detector.stats().await.seen_count, 3);
}

#[tokio::test]
async fn test_backfill_scan_is_idempotent_across_restart() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::open(temp.path()).await.unwrap());

    let history = FixedHistory::new(&[
        "📺 https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "🐦 https://x.com/a/status/111",
    ]);

    let first = DuplicateDetector::new(store.clone())
        .scan_channel_history(&history, "chan1", 1000)
        .await
        .unwrap();
    assert_eq!(first.ids_added, 2);

    // A fresh detector over the same store files, as the backfill command
    // builds on every run; known ids come back through the store, so the
    // re-scan adds nothing
    let detector = DuplicateDetector::new(store);
    let second = detector
        .scan_channel_history(&history, "chan1", 1000)
        .await
        .unwrap();
    assert_eq!(second.ids_added, 0);

    // No duplicate lines appended either
    let log = std::fs::read_to_string(temp.path().join("fingerprints.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 2);
}

#[tokio::test]
async fn test_backfill_respects_limit() {
    let (detector, _store, _temp) = create_detector().await;

    let history = FixedHistory::new(&[
        "https://x.com/a/status/1",
        "https://x.com/a/status/2",
        "https://x.com/a/status/3",
    ]);

    let report = detector
        .scan_channel_history(&history, "chan1", 2)
        .await
        .unwrap();
    assert_eq!(report.messages_scanned, 2);
    assert_eq!(report.ids_added, 2);
}

#[tokio::test]
async fn test_clear_only_drops_memory() {
    let (detector, _store, _temp) = create_detector().await;

    detector.mark_as_seen("https://x.com/i/status/9").await;
    detector.clear().await;
    assert_eq!(detector.stats().await.seen_count, 0);

    // The store still has the fingerprint, so the lookup falls through
    assert!(detector.is_duplicate("https://x.com/i/status/9").await);
}
