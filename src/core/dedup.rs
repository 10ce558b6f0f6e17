//! Fingerprint set for already-processed content.
//!
//! Fingerprints are normalized canonical URLs. The set lives in memory,
//! mirrored to the persistent store; on a miss the store is consulted so a
//! restarted process sees fingerprints written by earlier runs. The set
//! only grows — bounding memory is the state manager's job, not TTLs here.

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::adapters::{ChatHistory, ContentStore};

/// Summary of a backfill scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub messages_scanned: usize,
    pub ids_added: usize,
    pub errors: Vec<String>,
}

/// Counters exposed for the stats surface
#[derive(Debug, Clone, Serialize)]
pub struct DedupStats {
    pub seen_count: usize,
}

/// Maintains the set of content fingerprints already processed
pub struct DuplicateDetector {
    store: Arc<dyn ContentStore>,
    seen: RwLock<HashSet<String>>,
    youtube_pattern: Regex,
    x_pattern: Regex,
}

impl DuplicateDetector {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            seen: RwLock::new(HashSet::new()),
            youtube_pattern: Regex::new(
                r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/live/)([A-Za-z0-9_-]{6,})",
            )
            .expect("youtube pattern is valid"),
            x_pattern: Regex::new(r"(?:x\.com|twitter\.com)/[A-Za-z0-9_]+/status/(\d+)")
                .expect("x pattern is valid"),
        }
    }

    /// Normalize a URL into its fingerprint form
    pub fn normalize(url: &str) -> String {
        url.trim().trim_end_matches('/').to_string()
    }

    /// True if the URL has already been processed. Checks the in-memory
    /// set first, then falls through to the store (caching a hit).
    pub async fn is_duplicate(&self, url: &str) -> bool {
        let fingerprint = Self::normalize(url);

        if self.seen.read().await.contains(&fingerprint) {
            return true;
        }

        match self.store.has_fingerprint(&fingerprint).await {
            Ok(true) => {
                self.seen.write().await.insert(fingerprint);
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(error = %e, "Fingerprint lookup failed; treating as unseen");
                false
            }
        }
    }

    /// Record a URL as processed. Once this returns, `is_duplicate` is
    /// true for the rest of the process lifetime.
    pub async fn mark_as_seen(&self, url: &str) {
        let fingerprint = Self::normalize(url);

        let inserted = self.seen.write().await.insert(fingerprint.clone());
        if !inserted {
            return;
        }

        if let Err(e) = self.store.store_fingerprint(&fingerprint).await {
            warn!(
                %fingerprint,
                error = %e,
                "Fingerprint write failed; continuing with in-memory set only"
            );
        }
    }

    /// Extract canonical content URLs from one message's text
    fn extract_urls(&self, text: &str) -> Vec<String> {
        let mut urls = Vec::new();

        for caps in self.youtube_pattern.captures_iter(text) {
            urls.push(format!("https://www.youtube.com/watch?v={}", &caps[1]));
        }
        for caps in self.x_pattern.captures_iter(text) {
            urls.push(format!("https://x.com/i/status/{}", &caps[1]));
        }

        urls
    }

    /// One-time backfill: read past announcement messages and seed the
    /// seen-set so a restart does not re-announce items already posted.
    /// Per-message problems are collected; they never abort the scan.
    pub async fn scan_channel_history(
        &self,
        history: &dyn ChatHistory,
        channel: &str,
        limit: usize,
    ) -> anyhow::Result<ScanReport> {
        let messages = history.recent_messages(channel, limit).await?;
        let mut report = ScanReport {
            messages_scanned: messages.len(),
            ..Default::default()
        };

        for message in &messages {
            for url in self.extract_urls(&message.text) {
                // Falls through to the store, so re-running the scan after
                // a restart does not re-count or re-append known ids
                if self.is_duplicate(&url).await {
                    continue;
                }

                self.seen.write().await.insert(url.clone());
                if let Err(e) = self.store.store_fingerprint(&url).await {
                    report
                        .errors
                        .push(format!("message {}: {}", message.id, e));
                }
                report.ids_added += 1;
            }
        }

        info!(
            channel,
            messages = report.messages_scanned,
            added = report.ids_added,
            errors = report.errors.len(),
            "Channel history scan complete"
        );

        Ok(report)
    }

    pub async fn stats(&self) -> DedupStats {
        DedupStats {
            seen_count: self.seen.read().await.len(),
        }
    }

    /// Clear in-memory state (shutdown and test isolation); the store is
    /// left untouched.
    pub async fn clear(&self) {
        let mut seen = self.seen.write().await;
        debug!(count = seen.len(), "Clearing in-memory fingerprint set");
        seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FileStore;
    use tempfile::TempDir;

    async fn create_test_detector() -> (DuplicateDetector, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(temp.path()).await.unwrap());
        (DuplicateDetector::new(store), temp)
    }

    #[tokio::test]
    async fn test_mark_and_check() {
        let (detector, _temp) = create_test_detector().await;
        let url = "https://www.youtube.com/watch?v=abc123";

        assert!(!detector.is_duplicate(url).await);
        detector.mark_as_seen(url).await;
        assert!(detector.is_duplicate(url).await);
    }

    #[tokio::test]
    async fn test_normalization_trailing_slash() {
        let (detector, _temp) = create_test_detector().await;

        detector
            .mark_as_seen("https://x.com/i/status/123456/")
            .await;
        assert!(detector.is_duplicate("https://x.com/i/status/123456").await);
    }

    #[tokio::test]
    async fn test_store_fallthrough_survives_clear() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(temp.path()).await.unwrap());

        let detector = DuplicateDetector::new(store.clone());
        detector
            .mark_as_seen("https://www.youtube.com/watch?v=persist1")
            .await;
        detector.clear().await;

        // In-memory set is empty, but the store still answers
        assert!(
            detector
                .is_duplicate("https://www.youtube.com/watch?v=persist1")
                .await
        );
    }

    #[tokio::test]
    async fn test_extract_urls() {
        let (detector, _temp) = create_test_detector().await;

        let text = "📺 New video: https://www.youtube.com/watch?v=dQw4w9WgXcQ and \
                    🐦 https://x.com/someone/status/1234567890";
        let urls = detector.extract_urls(text);

        assert_eq!(
            urls,
            vec![
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                "https://x.com/i/status/1234567890".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_extract_short_youtube_url() {
        let (detector, _temp) = create_test_detector().await;

        let urls = detector.extract_urls("watch https://youtu.be/dQw4w9WgXcQ now");
        assert_eq!(urls, vec!["https://www.youtube.com/watch?v=dQw4w9WgXcQ"]);
    }
}
