//! Media kind and downloaded media representation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of media message sent to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Animation,
    Document,
    Audio,
}

impl MediaKind {
    /// Every kind, in reporting order.
    pub const ALL: [MediaKind; 5] = [
        MediaKind::Image,
        MediaKind::Video,
        MediaKind::Animation,
        MediaKind::Document,
        MediaKind::Audio,
    ];

    /// Storage and display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Animation => "animation",
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
        }
    }

    /// Map a file extension to the kind it is sent as. Unknown extensions are documents.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "gif" => MediaKind::Animation,
            "jpg" | "jpeg" | "png" | "webp" => MediaKind::Image,
            "mp4" | "avi" | "webm" | "mov" => MediaKind::Video,
            "mp3" | "ogg" | "m4a" | "wav" => MediaKind::Audio,
            _ => MediaKind::Document,
        }
    }

    /// Kind of a file judged by its extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(MediaKind::from_extension)
            .unwrap_or(MediaKind::Document)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MediaKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown media kind: {}", s))
    }
}

/// A media file materialized on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedMedia {
    /// Final path, including the detected extension.
    pub path: PathBuf,

    /// Kind derived from the detected extension.
    pub kind: MediaKind,

    /// File size in bytes.
    pub size: u64,
}

impl DownloadedMedia {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let kind = MediaKind::from_path(&path);
        Self { path, kind, size }
    }
}
