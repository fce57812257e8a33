//! Reposter - media reposting from subreddits into Telegram channels
//!
//! This library polls subreddit top listings, downloads embedded media and
//! forwards it to Telegram channels, remembering what was already posted.
//!
//! # Features
//!
//! - Provider rules for imgur, i.redd.it, v.redd.it gifs and gfycat
//! - Content type detection from downloaded bytes
//! - Time-bounded deduplication of reposted submissions
//! - Sent and delivered statistics per media kind and day
//! - Delivery confirmation handling that cleans up local files
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use reposter::{
//!     Browser, BrowserConfig, BrowserDeps, DownloadManager, HttpFetcher, MemoryStore,
//!     RedditClient, TelegramTransport, REDDIT_BASE, TELEGRAM_API_BASE,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let user_agent = "reposter/0.1";
//!     let transport = Arc::new(TelegramTransport::new("123456:ABC", TELEGRAM_API_BASE)?);
//!     let deps = BrowserDeps::new(
//!         Arc::new(RedditClient::new(user_agent, REDDIT_BASE)?),
//!         transport.clone(),
//!         Arc::new(MemoryStore::new()),
//!         DownloadManager::new(Arc::new(HttpFetcher::new(user_agent)?)),
//!     );
//!
//!     let browser = Browser::start(BrowserConfig::new("aww", "@aww_reposts"), deps).await?;
//!     // ... run until shutdown
//!     browser.stop().await;
//!     transport.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod feed;
pub mod fs;
pub mod media;
pub mod output;
pub mod shutdown;
pub mod stats;
pub mod store;
pub mod transport;

// Re-exports for convenience
pub use browser::{Browser, BrowserConfig, BrowserDeps, BrowserStatus};
pub use config::Config;
pub use download::{DownloadManager, HttpFetcher};
pub use error::{Error, Result};
pub use feed::{FeedClient, RedditClient, Submission, REDDIT_BASE};
pub use media::{MediaKind, MediaResolver};
pub use stats::{Action, StatsRecorder, StatsSnapshot};
pub use store::{KeyValueStore, MemoryStore, RetentionStore};
pub use transport::{MessagingTransport, TelegramTransport, TELEGRAM_API_BASE};
