//! Domain types for the herald engine.
//!
//! This module contains the core data structures:
//! - Content: discovered items, their lifecycle records, platform enums
//! - Outcome: structured results returned to producers

pub mod content;
pub mod outcome;

// Re-export commonly used types
pub use content::{ContentItem, ContentKind, ContentRecord, ContentState, Platform, Source};
pub use outcome::{ProcessingAction, ProcessingResult};
