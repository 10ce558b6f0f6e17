//! Configuration for herald.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (HERALD_HOME)
//! 2. Config file (.herald/config.yaml)
//! 3. Defaults (~/.herald)
//!
//! Config file discovery searches the current directory and parents for
//! .herald/config.yaml; relative paths in the file resolve against the
//! config file's parent directory.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::Deserialize;

use crate::adapters::DiscordConfig;
use crate::core::EngineSettings;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub engine: Option<EngineConfig>,
    #[serde(default)]
    pub discord: Option<DiscordConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Engine state directory (relative to the config file)
    pub home: Option<String>,
}

/// Engine tunables as they appear in the file (plain integer units)
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub max_content_age_hours: Option<i64>,
    pub init_grace_secs: Option<i64>,
    pub init_window_secs: Option<i64>,
    pub announce_old_content: Option<bool>,
}

impl EngineConfig {
    fn to_settings(&self) -> EngineSettings {
        let defaults = EngineSettings::default();
        EngineSettings {
            max_content_age: self
                .max_content_age_hours
                .map(Duration::hours)
                .unwrap_or(defaults.max_content_age),
            init_grace: self
                .init_grace_secs
                .map(Duration::seconds)
                .unwrap_or(defaults.init_grace),
            init_window: self
                .init_window_secs
                .map(Duration::seconds)
                .unwrap_or(defaults.init_window),
            announce_old_content: self
                .announce_old_content
                .unwrap_or(defaults.announce_old_content),
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to herald home (engine state)
    pub home: PathBuf,
    /// Engine gate tunables
    pub engine: EngineSettings,
    /// Discord adapter settings, if configured
    pub discord: Option<DiscordConfig>,
    /// Path to the config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Directory holding the JSONL store files
    pub fn store_dir(&self) -> PathBuf {
        self.home.join("store")
    }
}

/// Find the config file by searching the current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".herald").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse a config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".herald");

    let config_file = find_config_file();

    let (home, engine, discord) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        let home = if let Ok(env_home) = std::env::var("HERALD_HOME") {
            PathBuf::from(env_home)
        } else if let Some(ref home_path) = config.paths.home {
            // home is relative to the .herald/ directory
            let herald_dir = config_path.parent().unwrap_or(Path::new("."));
            resolve_path(herald_dir, home_path)
        } else {
            default_home.clone()
        };

        let engine = config
            .engine
            .as_ref()
            .map(EngineConfig::to_settings)
            .unwrap_or_default();

        (home, engine, config.discord)
    } else {
        let home = std::env::var("HERALD_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home.clone());

        (home, EngineSettings::default(), None)
    };

    Ok(ResolvedConfig {
        home,
        engine,
        discord,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let herald_dir = temp.path().join(".herald");
        std::fs::create_dir_all(&herald_dir).unwrap();

        let config_path = herald_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./
engine:
  max_content_age_hours: 48
  init_grace_secs: 600
  announce_old_content: true
discord:
  webhook_url: https://discord.test/webhook
  announce_channel: "123456"
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.home, Some("./".to_string()));

        let engine = config.engine.as_ref().unwrap().to_settings();
        assert_eq!(engine.max_content_age, Duration::hours(48));
        assert_eq!(engine.init_grace, Duration::seconds(600));
        assert!(engine.announce_old_content);
        // Unset fields fall back to defaults
        assert_eq!(engine.init_window, EngineSettings::default().init_window);

        let discord = config.discord.unwrap();
        assert_eq!(discord.announce_channel.as_deref(), Some("123456"));
        assert!(discord.posting_enabled);
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            resolve_path(&base, "sub"),
            PathBuf::from("/home/user/project/sub")
        );
    }

    #[test]
    fn test_reload_config_honors_home_override() {
        let temp = TempDir::new().unwrap();
        std::env::set_var("HERALD_HOME", temp.path());

        // Bypasses the OnceLock cache, so the override takes effect even
        // if config() already ran elsewhere
        let config = reload_config().unwrap();
        assert_eq!(config.home, temp.path());
        assert_eq!(config.store_dir(), temp.path().join("store"));

        std::env::remove_var("HERALD_HOME");
    }

    #[test]
    fn test_store_dir_under_home() {
        let config = ResolvedConfig {
            home: PathBuf::from("/test/.herald"),
            engine: EngineSettings::default(),
            discord: None,
            config_file: None,
        };
        assert_eq!(config.store_dir(), PathBuf::from("/test/.herald/store"));
    }
}
