//! Core coordination logic.
//!
//! This module contains:
//! - ContentStateManager: lifecycle records, mirrored to the store
//! - DuplicateDetector: fingerprint set + chat-history backfill
//! - LivestreamStateMachine: scheduled → live → ended enforcement
//! - ContentCoordinator: the per-id exactly-once processing engine
//! - EngineObserver: side-channel notifications for observability

pub mod coordinator;
pub mod dedup;
pub mod lifecycle;
pub mod observer;
pub mod state_manager;

// Re-export commonly used types
pub use coordinator::{ContentCoordinator, EngineSettings};
pub use dedup::{DedupStats, DuplicateDetector, ScanReport};
pub use lifecycle::{LivestreamStateMachine, TransitionOutcome};
pub use observer::{EngineObserver, TracingObserver};
pub use state_manager::ContentStateManager;
