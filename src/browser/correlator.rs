//! Delivery confirmation handling.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;

use crate::fs::is_within;
use crate::media::MediaKind;
use crate::stats::{Action, StatsRecorder};
use crate::transport::{DeliveredMessage, DeliveryListener};

/// Turns delivery confirmations of one pipeline into `delivered` statistics
/// and removes the delivered files.
///
/// A message belongs to the pipeline when it was sent to its channel and
/// carries a path inside its temporary directory.
pub struct DeliveryCorrelator {
    channel: String,
    tmp_dir: PathBuf,
    stats: StatsRecorder,
}

impl DeliveryCorrelator {
    pub fn new(channel: &str, tmp_dir: &Path, stats: StatsRecorder) -> Self {
        Self {
            channel: channel.to_string(),
            tmp_dir: tmp_dir.to_path_buf(),
            stats,
        }
    }

    fn owns(&self, message: &DeliveredMessage, path: &Path) -> bool {
        message.chat == self.channel && is_within(path, &self.tmp_dir)
    }
}

#[async_trait]
impl DeliveryListener for DeliveryCorrelator {
    async fn on_delivered(&self, message: &DeliveredMessage) {
        let Some(path) = message.media_path() else {
            tracing::debug!("Delivered message in {} carries no media file", message.chat);
            return;
        };

        if !self.owns(message, path) {
            return;
        }

        let size = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Delivered file {} no longer exists", path.display());
                return;
            }
            Err(e) => {
                tracing::warn!("Cannot inspect delivered file {}: {}", path.display(), e);
                return;
            }
        };

        // Whoever removes the file owns the confirmation; a duplicate finds it gone.
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Delivered file {} already handled", path.display());
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to remove delivered file {}: {}", path.display(), e);
                return;
            }
        }

        let kind = MediaKind::from_path(path);
        match self
            .stats
            .record(Action::Delivered, kind, size, Local::now())
            .await
        {
            Ok(()) => tracing::info!(
                "Delivered {} ({} bytes) to {}",
                path.display(),
                size,
                self.channel
            ),
            Err(e) => tracing::error!(
                "Failed to record delivery of {}: {}",
                path.display(),
                e
            ),
        }
    }
}
