//! Runtime configuration of a browse loop.

use std::path::PathBuf;
use std::time::Duration;

use crate::feed::TimeWindow;
use crate::store::key_prefix;

/// Settings of one (feed, channel) pipeline.
///
/// `top_num`, `browse_delay` and `feed_name` can change while the loop runs;
/// each poll works on a snapshot taken when it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    pub feed_name: String,
    pub channel_name: String,
    pub top_num: usize,
    pub browse_delay: Duration,
    pub cleanup_delay: Duration,
    pub tmp_dir: PathBuf,
    pub top_window: TimeWindow,
}

impl BrowserConfig {
    pub fn new(feed_name: &str, channel_name: &str) -> Self {
        Self {
            feed_name: feed_name.to_string(),
            channel_name: channel_name.to_string(),
            top_num: 20,
            browse_delay: Duration::from_secs(3600),
            cleanup_delay: Duration::from_secs(86400),
            tmp_dir: PathBuf::from("tmp"),
            top_window: TimeWindow::Day,
        }
    }

    /// Storage namespace of this pipeline.
    pub fn key_prefix(&self) -> String {
        key_prefix(&self.feed_name, &self.channel_name)
    }
}
