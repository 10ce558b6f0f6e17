//! Discord adapters: webhook announcer and history client.
//!
//! The announcer posts through a webhook (`?wait=true` so Discord returns
//! the created message). The history client pages the bot API's channel
//! messages endpoint for backfill scanning.

use async_trait::async_trait;
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::{ContentKind, ContentRecord, Platform};

use super::{AnnounceOptions, AnnounceResult, Announcer, ChatHistory, ChatMessage};

const DISCORD_API: &str = "https://discord.com/api/v10";

/// Maximum messages per history page (Discord API limit)
const HISTORY_PAGE_SIZE: usize = 100;

/// Configuration for the Discord adapters
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Webhook URL for announcements
    pub webhook_url: String,

    /// Bot token (needed for history reads only)
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Channel the announcements land in (used for backfill scanning)
    #[serde(default)]
    pub announce_channel: Option<String>,

    /// Operator kill-switch: master posting toggle
    #[serde(default = "default_true")]
    pub posting_enabled: bool,

    /// Operator kill-switch: announcement messages specifically
    #[serde(default = "default_true")]
    pub announcements_enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Message returned by Discord when a webhook is executed with ?wait=true
#[derive(Debug, Deserialize)]
struct DiscordMessage {
    id: String,
    channel_id: String,
}

/// Webhook-based announcer
pub struct DiscordAnnouncer {
    config: DiscordConfig,
    client: reqwest::Client,
}

impl DiscordAnnouncer {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Render the chat message for a record
    fn format_message(record: &ContentRecord) -> String {
        let item = &record.item;
        let author = item.author.as_deref().unwrap_or("unknown");
        let title = item.title.as_deref().unwrap_or(&item.url);

        match (item.platform, item.kind) {
            (Platform::Youtube, ContentKind::Livestream) => {
                format!("🔴 {} is live: **{}**\n{}", author, title, item.url)
            }
            (Platform::Youtube, _) => {
                format!("📺 New video from {}: **{}**\n{}", author, title, item.url)
            }
            (Platform::X, ContentKind::Reply) => {
                format!("💬 {} replied:\n{}", author, item.url)
            }
            (Platform::X, ContentKind::Retweet) => {
                format!("🔁 {} retweeted:\n{}", author, item.url)
            }
            (Platform::X, _) => {
                format!("🐦 New post from {}:\n{}", author, item.url)
            }
        }
    }
}

#[async_trait]
impl Announcer for DiscordAnnouncer {
    async fn announce(
        &self,
        record: &ContentRecord,
        options: AnnounceOptions,
    ) -> Result<AnnounceResult> {
        // Kill-switches are operator policy; force bypasses them but not
        // the coordinator's own dedup/age gates.
        if !options.force {
            if !self.config.posting_enabled {
                return Ok(AnnounceResult::suppressed("posting_disabled"));
            }
            if !self.config.announcements_enabled {
                return Ok(AnnounceResult::suppressed("announcements_disabled"));
            }
        }

        let url = format!("{}?wait=true", self.config.webhook_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "content": Self::format_message(record),
            }))
            .send()
            .await
            .context("Failed to execute Discord webhook")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Discord webhook returned {}: {}", status, body);
        }

        let message: DiscordMessage = response
            .json()
            .await
            .context("Failed to parse Discord webhook response")?;

        Ok(AnnounceResult::sent(message.id, message.channel_id))
    }
}

/// Raw message from the channel messages endpoint
#[derive(Debug, Deserialize)]
struct DiscordHistoryMessage {
    id: String,
    content: String,
    timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

/// Bot-token history client for backfill scanning
pub struct DiscordHistory {
    bot_token: String,
    client: reqwest::Client,
}

impl DiscordHistory {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_page(
        &self,
        channel: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<DiscordHistoryMessage>> {
        let mut url = format!(
            "{}/channels/{}/messages?limit={}",
            DISCORD_API, channel, limit
        );
        if let Some(before) = before {
            url.push_str(&format!("&before={}", before));
        }

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .send()
            .await
            .context("Failed to fetch channel history")?;

        if !response.status().is_success() {
            anyhow::bail!("Discord history request returned {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse channel history response")
    }
}

#[async_trait]
impl ChatHistory for DiscordHistory {
    async fn recent_messages(&self, channel: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        let mut messages = Vec::new();
        let mut before: Option<String> = None;

        while messages.len() < limit {
            let page_size = HISTORY_PAGE_SIZE.min(limit - messages.len());
            let page = self.fetch_page(channel, page_size, before.as_deref()).await?;

            if page.is_empty() {
                break;
            }

            before = page.last().map(|m| m.id.clone());
            messages.extend(page.into_iter().map(|m| ChatMessage {
                id: m.id,
                text: m.content,
                posted_at: m.timestamp,
            }));
        }

        Ok(messages)
    }
}
