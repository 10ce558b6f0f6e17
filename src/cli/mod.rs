//! Command-line interface for herald.
//!
//! Operational commands over the persisted engine state: inspect stats,
//! garbage-collect old records, and run the one-time backfill scan that
//! seeds the dedup set from chat history.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use clap::{Parser, Subcommand};

use crate::adapters::{ContentStore, DiscordHistory, FileStore};
use crate::config;
use crate::core::{ContentStateManager, DuplicateDetector};

/// herald - exactly-once content announcement engine
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show store and dedup statistics
    Stats,

    /// Remove old, inactive content records
    Cleanup {
        /// Age threshold in hours (defaults to the configured max age)
        #[arg(long)]
        max_age_hours: Option<i64>,
    },

    /// Seed the dedup set by scanning past announcement messages
    Backfill {
        /// Channel to scan (defaults to the configured announce channel)
        #[arg(long)]
        channel: Option<String>,

        /// Maximum number of messages to scan
        #[arg(short, long, default_value = "1000")]
        limit: usize,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Stats => cmd_stats().await,
            Commands::Cleanup { max_age_hours } => cmd_cleanup(max_age_hours).await,
            Commands::Backfill { channel, limit } => cmd_backfill(channel, limit).await,
            Commands::Config => cmd_config(),
        }
    }
}

async fn open_store() -> Result<Arc<FileStore>> {
    let cfg = config::config()?;
    Ok(Arc::new(FileStore::open(cfg.store_dir()).await?))
}

async fn cmd_stats() -> Result<()> {
    let store = open_store().await?;
    let stats = store.storage_stats().await?;

    println!("Content states: {}", stats.content_states);
    println!("Fingerprints:   {}", stats.fingerprints);
    Ok(())
}

async fn cmd_cleanup(max_age_hours: Option<i64>) -> Result<()> {
    let cfg = config::config()?;
    let max_age = max_age_hours
        .map(Duration::hours)
        .unwrap_or(cfg.engine.max_content_age);

    let store = open_store().await?;
    let manager = ContentStateManager::new(store);
    manager.load().await?;

    let removed = manager.cleanup_old_states(max_age).await;
    println!("Removed {} old content record(s)", removed);
    println!("{} record(s) remain", manager.len().await);
    Ok(())
}

async fn cmd_backfill(channel: Option<String>, limit: usize) -> Result<()> {
    let cfg = config::config()?;
    let discord = cfg
        .discord
        .as_ref()
        .context("Discord is not configured; set discord.* in config.yaml")?;

    let channel = channel
        .or_else(|| discord.announce_channel.clone())
        .context("No channel given and no announce_channel configured")?;
    let token = discord
        .bot_token
        .clone()
        .context("Backfill requires discord.bot_token")?;

    let store = open_store().await?;
    let detector = DuplicateDetector::new(store);
    let history = DiscordHistory::new(token);

    let report = detector
        .scan_channel_history(&history, &channel, limit)
        .await?;

    println!("Scanned {} message(s)", report.messages_scanned);
    println!("Added {} fingerprint(s)", report.ids_added);
    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for error in &report.errors {
            println!("  {}", error);
        }
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let cfg = config::config()?;

    println!("Home:        {}", cfg.home.display());
    println!("Store:       {}", cfg.store_dir().display());
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("Engine:      {:?}", cfg.engine);
    println!(
        "Discord:     {}",
        if cfg.discord.is_some() {
            "configured"
        } else {
            "not configured"
        }
    );
    Ok(())
}
