//! herald - exactly-once content announcement engine
//!
//! A content-ingestion bot watches a YouTube channel and an X account and
//! announces new items into chat. Three independent, unreliable producers
//! (push webhooks, API polling, browser scraping) may all report the same
//! item, concurrently and out of order; this crate is the engine that
//! guarantees each item is announced at most once.
//!
//! # Architecture
//!
//! - Every sighting funnels through `ContentCoordinator::process_content`,
//!   which runs dedup/age/state gates inside a per-id critical section
//! - State and fingerprints live in memory, mirrored best-effort to a
//!   persistent store so restarts do not re-announce
//! - Livestreams additionally move through a monotonic
//!   scheduled → live → ended lifecycle
//!
//! # Modules
//!
//! - `adapters`: seams for the announcer, store and chat history, plus
//!   Discord and JSONL-file implementations
//! - `core`: coordinator, state manager, duplicate detector, lifecycle
//! - `domain`: content items, records, processing results
//! - `cli`: operational commands (stats, cleanup, backfill)

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use self::core::{
    ContentCoordinator, ContentStateManager, DuplicateDetector, EngineSettings,
    LivestreamStateMachine, TransitionOutcome,
};
pub use domain::{
    ContentItem, ContentKind, ContentRecord, ContentState, Platform, ProcessingAction,
    ProcessingResult, Source,
};

// Adapter seams and concrete adapters
pub use adapters::{
    AnnounceOptions, AnnounceResult, Announcer, ChatHistory, ChatMessage, ContentStore,
    DiscordAnnouncer, DiscordConfig, DiscordHistory, FileStore, StorageStats, StoreError,
};
