//! Content items and their lifecycle records.
//!
//! A `ContentItem` is what producers report; a `ContentRecord` wraps it
//! with the engine's bookkeeping (state, announced flag, timestamps).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform a content item originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    X,
}

impl Platform {
    /// Short name used in log fields and message formatting
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::X => "x",
        }
    }
}

/// Kind of content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Video,
    Livestream,
    Post,
    Reply,
    Quote,
    Retweet,
}

impl ContentKind {
    /// Whether this kind goes through the livestream lifecycle
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Self::Livestream)
    }
}

/// Which producer reported a content sighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Webhook,
    Scraper,
    ApiFallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::Scraper => "scraper",
            Self::ApiFallback => "api-fallback",
        }
    }
}

/// Lifecycle state of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentState {
    /// First sighting, no further classification yet
    Discovered,

    /// Broadcast scheduled but not started
    Scheduled,

    /// Broadcast currently live
    Live,

    /// Broadcast finished (terminal for the livestream lifecycle)
    Ended,

    /// Announcement delivered
    Announced,

    /// Deliberately not announced (duplicate, too old)
    Skipped,

    /// Announcement attempt failed
    Failed,
}

impl ContentState {
    /// Position in the livestream ordering, if this state participates in it
    pub fn broadcast_rank(&self) -> Option<u8> {
        match self {
            Self::Scheduled => Some(0),
            Self::Live => Some(1),
            Self::Ended => Some(2),
            _ => None,
        }
    }

    /// States that should never be garbage-collected while current
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Live)
    }
}

/// A discovered piece of content as reported by a producer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Platform-native identifier (unique within a platform)
    pub id: String,

    /// Platform the item belongs to
    pub platform: Platform,

    /// Kind of item
    pub kind: ContentKind,

    /// Canonical locator; also the dedup fingerprint basis
    pub url: String,

    /// Title or post text
    pub title: Option<String>,

    /// Author or channel title
    pub author: Option<String>,

    /// Origin timestamp
    pub published_at: Option<DateTime<Utc>>,

    /// Open attribute map (e.g. scheduled_start_time)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ContentItem {
    /// Create a minimal item; display metadata filled in via the builders
    pub fn new(id: impl Into<String>, platform: Platform, kind: ContentKind, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            platform,
            kind,
            url: url.into(),
            title: None,
            author: None,
            published_at: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }
}

/// Stored lifecycle record for a content item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    /// The item as last reported
    pub item: ContentItem,

    /// Current lifecycle state
    pub state: ContentState,

    /// Producer that most recently reported the item
    pub source: Source,

    /// Whether the announcement has been delivered (flips false→true once)
    pub announced: bool,

    /// When the announcement was delivered
    pub announced_at: Option<DateTime<Utc>>,

    /// When the engine first saw the item
    pub first_seen_at: DateTime<Utc>,

    /// Last mutation time (used by cleanup)
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// Create a fresh record for a first sighting
    pub fn new(item: ContentItem, source: Source) -> Self {
        let now = Utc::now();
        let state = if item.kind.is_broadcast() {
            ContentState::Scheduled
        } else {
            ContentState::Discovered
        };
        Self {
            item,
            state,
            source,
            announced: false,
            announced_at: None,
            first_seen_at: now,
            updated_at: now,
        }
    }

    /// Content id shorthand
    pub fn id(&self) -> &str {
        &self.item.id
    }
}
