//! Configuration file parser for ~/.config/newswire/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Feed entries with invalid URLs are skipped with a warning rather than
//! failing the whole load; a typo in one subscription should not take down
//! the rest.
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::feed::ReconcilePolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One subscribed feed: its URL and an optional display-title override.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedEntry {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified; missing keys fall back to the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Subscribed feeds.
    pub feeds: Vec<FeedEntry>,

    /// Polling interval in minutes.
    pub refresh_interval_minutes: u64,

    /// Maximum items retained per feed (0 = unlimited).
    pub max_items: usize,

    /// Whether display listings include already-read items.
    pub show_read_items: bool,

    /// Fetches an unread item may be absent from the upstream document
    /// before it is dropped (0 = drop immediately).
    pub unread_retention_cycles: u32,

    /// Where per-feed read-state files live. Defaults to
    /// ~/.local/share/newswire at the binary boundary when unset.
    pub storage_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            refresh_interval_minutes: 5,
            max_items: 100,
            show_read_items: true,
            unread_retention_cycles: 3,
            storage_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            feeds = config.feeds.len(),
            interval_minutes = config.refresh_interval_minutes,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Feed entries with syntactically valid http(s) URLs; everything else
    /// is dropped with a warning.
    pub fn valid_feeds(&self) -> Vec<FeedEntry> {
        self.feeds
            .iter()
            .filter(|entry| match url::Url::parse(&entry.url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => true,
                Ok(parsed) => {
                    tracing::warn!(url = %entry.url, scheme = %parsed.scheme(), "Skipping feed with unsupported scheme");
                    false
                }
                Err(e) => {
                    tracing::warn!(url = %entry.url, error = %e, "Skipping feed with invalid URL");
                    false
                }
            })
            .cloned()
            .collect()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.max(1) * 60)
    }

    pub fn policy(&self) -> ReconcilePolicy {
        ReconcilePolicy {
            max_items: self.max_items,
            unread_retention_cycles: self.unread_retention_cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.feeds.is_empty());
        assert_eq!(config.refresh_interval_minutes, 5);
        assert_eq!(config.max_items, 100);
        assert!(config.show_read_items);
        assert_eq!(config.unread_retention_cycles, 3);
        assert!(config.storage_dir.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/newswire_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.refresh_interval_minutes, 5);
    }

    #[test]
    fn test_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let content = r#"
refresh_interval_minutes = 15
max_items = 50
show_read_items = false
unread_retention_cycles = 0
storage_dir = "/var/lib/newswire"

[[feeds]]
url = "https://example.com/rss"

[[feeds]]
url = "https://example.org/atom"
title = "Org News"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.refresh_interval_minutes, 15);
        assert_eq!(config.max_items, 50);
        assert!(!config.show_read_items);
        assert_eq!(config.unread_retention_cycles, 0);
        assert_eq!(config.storage_dir.as_deref(), Some(Path::new("/var/lib/newswire")));
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.feeds[1].title.as_deref(), Some("Org News"));
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refresh_interval_minutes = 30\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.refresh_interval_minutes, 30);
        assert_eq!(config.max_items, 100); // default
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_valid_feeds_skips_bad_urls() {
        let config = Config {
            feeds: vec![
                FeedEntry {
                    url: "https://good.example/rss".into(),
                    title: None,
                },
                FeedEntry {
                    url: "ftp://wrong.example/rss".into(),
                    title: None,
                },
                FeedEntry {
                    url: "not a url".into(),
                    title: None,
                },
            ],
            ..Default::default()
        };

        let valid = config.valid_feeds();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].url, "https://good.example/rss");
    }

    #[test]
    fn test_interval_floor_is_one_minute() {
        let config = Config {
            refresh_interval_minutes: 0,
            ..Default::default()
        };
        assert_eq!(config.interval(), Duration::from_secs(60));
    }
}
