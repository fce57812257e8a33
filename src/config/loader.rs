//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::BrowserConfig;
use crate::error::{Error, Result};
use crate::feed::{TimeWindow, REDDIT_BASE};
use crate::transport::TELEGRAM_API_BASE;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reddit: RedditConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// One entry per (subreddit, channel) pair.
    #[serde(default)]
    pub browsers: Vec<BrowserEntry>,
}

/// Reddit access configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// User agent sent with every Reddit request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Listing API base URL.
    #[serde(default = "default_reddit_base")]
    pub api_base: String,
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token (`123456:ABC...`).
    #[serde(default)]
    pub bot_token: String,

    /// Bot API base URL.
    #[serde(default = "default_telegram_base")]
    pub api_base: String,
}

/// Keyed storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON snapshot file. Without it the store lives in memory only.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: Option<PathBuf>,
}

/// One reposting pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserEntry {
    /// Subreddit name, without the `r/` prefix.
    pub feed: String,

    /// Target channel (`@name` or numeric chat id).
    pub channel: String,

    /// Number of top submissions fetched per poll.
    #[serde(default = "default_top_num")]
    pub top_num: usize,

    /// Seconds between the starts of two polls.
    #[serde(default = "default_browse_delay")]
    pub browse_delay_seconds: u64,

    /// Seconds a reposted id is remembered.
    #[serde(default = "default_cleanup_delay")]
    pub cleanup_delay_seconds: u64,

    /// Directory for downloaded media awaiting delivery.
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: PathBuf,

    /// Time window of the top listing.
    #[serde(default)]
    pub top_window: TimeWindow,
}

impl BrowserEntry {
    /// Entry with default settings.
    pub fn new(feed: &str, channel: &str) -> Self {
        Self {
            feed: feed.to_string(),
            channel: channel.to_string(),
            top_num: default_top_num(),
            browse_delay_seconds: default_browse_delay(),
            cleanup_delay_seconds: default_cleanup_delay(),
            tmp_dir: default_tmp_dir(),
            top_window: TimeWindow::default(),
        }
    }

    /// Runtime configuration of the pipeline.
    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            feed_name: self.feed.clone(),
            channel_name: self.channel.clone(),
            top_num: self.top_num,
            browse_delay: Duration::from_secs(self.browse_delay_seconds),
            cleanup_delay: Duration::from_secs(self.cleanup_delay_seconds),
            tmp_dir: self.tmp_dir.clone(),
            top_window: self.top_window,
        }
    }
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            api_base: default_reddit_base(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: default_telegram_base(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_user_agent() -> String {
    format!("reposter/{} (media reposter bot)", env!("CARGO_PKG_VERSION"))
}

fn default_reddit_base() -> String {
    REDDIT_BASE.to_string()
}

fn default_telegram_base() -> String {
    TELEGRAM_API_BASE.to_string()
}

fn default_snapshot_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/store.json"))
}

fn default_top_num() -> usize {
    20
}

fn default_browse_delay() -> u64 {
    3600
}

fn default_cleanup_delay() -> u64 {
    86400
}

fn default_tmp_dir() -> PathBuf {
    PathBuf::from("tmp")
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123456:ABCdef"

            [[browsers]]
            feed = "aww"
            channel = "@aww_reposts"
            "#,
        )
        .unwrap();

        assert_eq!(config.reddit.api_base, REDDIT_BASE);
        assert_eq!(config.telegram.api_base, TELEGRAM_API_BASE);
        assert_eq!(config.storage.snapshot_path, Some(PathBuf::from("data/store.json")));

        let entry = &config.browsers[0];
        assert_eq!(entry, &BrowserEntry::new("aww", "@aww_reposts"));

        let browser = entry.browser_config();
        assert_eq!(browser.top_num, 20);
        assert_eq!(browser.browse_delay, Duration::from_secs(3600));
        assert_eq!(browser.cleanup_delay, Duration::from_secs(86400));
        assert_eq!(browser.tmp_dir, PathBuf::from("tmp"));
        assert_eq!(browser.top_window, TimeWindow::Day);
    }

    #[test]
    fn test_explicit_values() {
        let config: Config = toml::from_str(
            r#"
            [[browsers]]
            feed = "gifs"
            channel = "@gif_channel"
            top_num = 5
            browse_delay_seconds = 600
            cleanup_delay_seconds = 3600
            tmp_dir = "/var/tmp/gifs"
            top_window = "week"
            "#,
        )
        .unwrap();

        let browser = config.browsers[0].browser_config();
        assert_eq!(browser.feed_name, "gifs");
        assert_eq!(browser.top_num, 5);
        assert_eq!(browser.browse_delay, Duration::from_secs(600));
        assert_eq!(browser.tmp_dir, PathBuf::from("/var/tmp/gifs"));
        assert_eq!(browser.top_window, TimeWindow::Week);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.telegram.bot_token = "123456:ABCdef".into();
        config.browsers.push(BrowserEntry::new("aww", "@aww_reposts"));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.telegram.bot_token, "123456:ABCdef");
        assert_eq!(loaded.browsers, config.browsers);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[[browsers]\nfeed = ").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::TomlParse(_))));
    }
}
