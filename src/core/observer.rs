//! Observability seam for the engine.
//!
//! The coordinator and state machine report notable moments through this
//! trait instead of firing ad hoc side effects. The default implementation
//! just logs through `tracing`; tests install counters.

use tracing::info;

use crate::domain::{ContentState, ProcessingResult};

/// Receiver for engine-level notifications
pub trait EngineObserver: Send + Sync {
    /// A `process_content` call finished with this result
    fn on_processed(&self, result: &ProcessingResult);

    /// A livestream moved forward in its lifecycle
    fn on_transition(&self, content_id: &str, from: ContentState, to: ContentState);
}

/// Default observer: structured log lines only
#[derive(Debug, Default)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn on_processed(&self, result: &ProcessingResult) {
        info!(
            content_id = %result.content_id,
            source = result.source.as_str(),
            action = ?result.action,
            reason = result.reason.as_deref().unwrap_or(""),
            "Content processed"
        );
    }

    fn on_transition(&self, content_id: &str, from: ContentState, to: ContentState) {
        info!(%content_id, ?from, ?to, "Livestream transition");
    }
}
