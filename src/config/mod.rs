//! Configuration module for the reposter.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{BrowserEntry, Config, RedditConfig, StorageConfig, TelegramConfig};
pub use validation::{
    validate_browsers, validate_channel_name, validate_config, validate_delay, validate_feed_name,
    validate_top_num,
};
