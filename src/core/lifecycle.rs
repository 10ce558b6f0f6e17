//! Livestream lifecycle enforcement.
//!
//! Broadcast-type content moves scheduled → live → ended, never backward.
//! Backward transitions are stale data from a slower poller and are
//! ignored rather than treated as errors. Storage is delegated entirely
//! to the `ContentStateManager`.

use std::sync::Arc;

use tracing::debug;

use crate::domain::ContentState;

use super::observer::EngineObserver;
use super::state_manager::ContentStateManager;

/// Outcome of a transition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Moved forward; observers were notified
    Applied { from: ContentState },

    /// Already in the requested state; idempotent no-op
    NoChange,

    /// Requested state is behind the current one; ignored as stale
    IgnoredStale { current: ContentState },

    /// No record exists for this id
    NotTracked,

    /// The requested or current state is outside the broadcast lifecycle
    NotBroadcastState,
}

/// Enforces legal state transitions for broadcast content
pub struct LivestreamStateMachine {
    state: Arc<ContentStateManager>,
    observer: Arc<dyn EngineObserver>,
}

impl LivestreamStateMachine {
    pub fn new(state: Arc<ContentStateManager>, observer: Arc<dyn EngineObserver>) -> Self {
        Self { state, observer }
    }

    /// Apply the transition table to one content id
    pub async fn transition_state(&self, id: &str, new_state: ContentState) -> TransitionOutcome {
        let Some(new_rank) = new_state.broadcast_rank() else {
            return TransitionOutcome::NotBroadcastState;
        };

        let Some(record) = self.state.get_content_state(id).await else {
            return TransitionOutcome::NotTracked;
        };

        let current = record.state;
        let Some(current_rank) = current.broadcast_rank() else {
            return TransitionOutcome::NotBroadcastState;
        };

        if new_rank == current_rank {
            return TransitionOutcome::NoChange;
        }

        if new_rank < current_rank {
            debug!(%id, ?current, requested = ?new_state, "Ignoring stale backward transition");
            return TransitionOutcome::IgnoredStale { current };
        }

        self.state
            .update_content(id, |r| r.state = new_state)
            .await;
        self.observer.on_transition(id, current, new_state);

        TransitionOutcome::Applied { from: current }
    }

    /// Current lifecycle state, if tracked
    pub async fn current_state(&self, id: &str) -> Option<ContentState> {
        self.state.get_content_state(id).await.map(|r| r.state)
    }
}
