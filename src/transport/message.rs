//! Delivery confirmation messages.

use std::path::{Path, PathBuf};

use crate::media::MediaKind;

/// Size tag of the photo variant that carries the uploaded original.
pub const ORIGINAL_PHOTO_SIZE: &str = "i";

/// Local file reference attached to delivered content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFile {
    pub path: Option<PathBuf>,
}

impl LocalFile {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// The path, if present and non-empty.
    pub fn local_path(&self) -> Option<&Path> {
        self.path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// One rendition of a delivered photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSize {
    /// Size tag (`"s"`, `"m"`, `"x"`, `"i"`, ...).
    pub kind: String,
    pub width: u32,
    pub height: u32,
    pub file: LocalFile,
}

/// Content of a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Photo { sizes: Vec<PhotoSize> },
    Video { video: LocalFile },
    Animation { animation: LocalFile },
    Document { document: LocalFile },
    Audio { audio: LocalFile },
    Text { text: String },
}

impl MessageContent {
    /// Content of a media message of `kind` backed by the local file at `path`.
    pub fn for_upload(kind: MediaKind, path: &Path) -> Self {
        let file = LocalFile::at(path);
        match kind {
            MediaKind::Image => MessageContent::Photo {
                sizes: vec![PhotoSize {
                    kind: ORIGINAL_PHOTO_SIZE.to_string(),
                    width: 0,
                    height: 0,
                    file,
                }],
            },
            MediaKind::Video => MessageContent::Video { video: file },
            MediaKind::Animation => MessageContent::Animation { animation: file },
            MediaKind::Document => MessageContent::Document { document: file },
            MediaKind::Audio => MessageContent::Audio { audio: file },
        }
    }

    /// Local media path carried by the content.
    ///
    /// Photos use the `"i"` size, falling back to the largest size with a path.
    pub fn media_path(&self) -> Option<&Path> {
        match self {
            MessageContent::Photo { sizes } => sizes
                .iter()
                .find(|s| s.kind == ORIGINAL_PHOTO_SIZE && s.file.local_path().is_some())
                .or_else(|| {
                    sizes
                        .iter()
                        .filter(|s| s.file.local_path().is_some())
                        .max_by_key(|s| u64::from(s.width) * u64::from(s.height))
                })
                .and_then(|s| s.file.local_path()),
            MessageContent::Video { video: file }
            | MessageContent::Animation { animation: file }
            | MessageContent::Document { document: file }
            | MessageContent::Audio { audio: file } => file.local_path(),
            MessageContent::Text { .. } => None,
        }
    }
}

/// A message the transport confirmed as delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    /// Chat the message landed in, as addressed by the sender.
    pub chat: String,
    pub content: MessageContent,
}

impl DeliveredMessage {
    pub fn new(chat: &str, content: MessageContent) -> Self {
        Self {
            chat: chat.to_string(),
            content,
        }
    }

    /// Local media path carried by the message, if any.
    pub fn media_path(&self) -> Option<&Path> {
        self.content.media_path()
    }
}
