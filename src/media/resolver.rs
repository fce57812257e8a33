//! Media URL resolution for feed submissions.
//!
//! A [`MediaResolver`] holds an ordered table of [`MediaRule`]s, one per hosting
//! provider. The first rule whose host matches the submission URL decides the
//! outcome; when it cannot produce a target the submission is skipped.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::feed::Submission;
use crate::fs::sanitize_media_id;

/// Download target computed for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    /// URL to fetch the media from.
    pub download_url: String,

    /// Local path without extension (`{tmp_dir}/{media_id}`).
    pub base_path: PathBuf,

    /// Extension used when the downloaded bytes are not recognized.
    pub default_extension: String,
}

/// Provider-level result, before it is placed in the temporary directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTarget {
    pub download_url: String,
    pub media_id: String,
    pub default_extension: String,
}

/// One hosting provider's URL rules.
pub trait MediaRule: Send + Sync {
    /// Provider name, for logging.
    fn name(&self) -> &'static str;

    /// Whether the provider owns this URL.
    fn claims(&self, url: &Url) -> bool;

    /// Compute the download target for a claimed URL.
    fn resolve(&self, url: &Url, submission: &Submission) -> Option<MediaTarget>;
}

/// Ordered table of provider rules.
pub struct MediaResolver {
    tmp_dir: PathBuf,
    rules: Vec<Box<dyn MediaRule>>,
}

impl MediaResolver {
    /// Resolver with the built-in provider table.
    pub fn new(tmp_dir: impl Into<PathBuf>) -> Self {
        Self::empty(tmp_dir)
            .with_rule(ImgurRule)
            .with_rule(RedditVideoRule)
            .with_rule(RedditImageRule)
            .with_rule(GfycatRule)
    }

    /// Resolver without any rules.
    pub fn empty(tmp_dir: impl Into<PathBuf>) -> Self {
        Self {
            tmp_dir: tmp_dir.into(),
            rules: Vec::new(),
        }
    }

    /// Append a rule; it is consulted after every rule already present.
    pub fn with_rule(mut self, rule: impl MediaRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    /// Resolve a submission to a download target, or `None` to skip it.
    pub fn resolve(&self, submission: &Submission) -> Option<ResolvedMedia> {
        let url = match Url::parse(&submission.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(
                    "Skipping {}: unparsable URL '{}': {}",
                    submission.id,
                    submission.url,
                    e
                );
                return None;
            }
        };

        let Some(rule) = self.rules.iter().find(|rule| rule.claims(&url)) else {
            tracing::debug!("Skipping {}: no provider for {}", submission.id, url);
            return None;
        };

        let Some(target) = rule.resolve(&url, submission) else {
            tracing::debug!(
                "Skipping {}: {} URL not supported: {}",
                submission.id,
                rule.name(),
                url
            );
            return None;
        };

        let media_id = match sanitize_media_id(&target.media_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", submission.id, e);
                return None;
            }
        };

        Some(ResolvedMedia {
            download_url: target.download_url,
            base_path: self.tmp_dir.join(media_id),
            default_extension: target.default_extension,
        })
    }
}

fn is_https_host(url: &Url, host: &str) -> bool {
    url.scheme() == "https" && url.host_str() == Some(host)
}

/// `/<id>.<ext>` with a single path segment.
static FILE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([^/]+)\.(\w+)$").expect("valid file segment regex"));

/// `/<id>` optionally followed by a slash.
static ID_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([^/.]+)/?$").expect("valid id segment regex"));

fn split_file_segment(url: &Url) -> Option<(String, String)> {
    let captures = FILE_SEGMENT.captures(url.path())?;
    Some((captures[1].to_string(), captures[2].to_string()))
}

/// Imgur direct links: `.gifv` through the download endpoint, images as-is.
pub struct ImgurRule;

impl MediaRule for ImgurRule {
    fn name(&self) -> &'static str {
        "imgur"
    }

    fn claims(&self, url: &Url) -> bool {
        is_https_host(url, "i.imgur.com")
    }

    fn resolve(&self, url: &Url, _submission: &Submission) -> Option<MediaTarget> {
        let (media_id, suffix) = split_file_segment(url)?;

        let (download_url, default_extension) = match suffix.as_str() {
            "gifv" => (format!("https://imgur.com/download/{}", media_id), "gif"),
            "gif" | "jpg" | "png" => (
                format!("https://i.imgur.com/{}.{}", media_id, suffix),
                suffix.as_str(),
            ),
            _ => return None,
        };

        Some(MediaTarget {
            download_url,
            default_extension: default_extension.to_string(),
            media_id,
        })
    }
}

/// Reddit-hosted video. Only silent gif-style videos are taken; regular videos
/// keep audio in a separate stream.
pub struct RedditVideoRule;

impl MediaRule for RedditVideoRule {
    fn name(&self) -> &'static str {
        "v.redd.it"
    }

    fn claims(&self, url: &Url) -> bool {
        is_https_host(url, "v.redd.it")
    }

    fn resolve(&self, url: &Url, submission: &Submission) -> Option<MediaTarget> {
        let video = submission.reddit_video()?;
        if !video.is_gif || video.fallback_url.is_empty() {
            return None;
        }

        let captures = ID_SEGMENT.captures(url.path())?;

        Some(MediaTarget {
            download_url: video.fallback_url.clone(),
            media_id: captures[1].to_string(),
            default_extension: "mp4".to_string(),
        })
    }
}

/// Reddit-hosted images, downloaded as-is.
pub struct RedditImageRule;

impl MediaRule for RedditImageRule {
    fn name(&self) -> &'static str {
        "i.redd.it"
    }

    fn claims(&self, url: &Url) -> bool {
        is_https_host(url, "i.redd.it")
    }

    fn resolve(&self, url: &Url, _submission: &Submission) -> Option<MediaTarget> {
        let (media_id, default_extension) = match split_file_segment(url) {
            Some((id, suffix)) => (id, suffix.to_lowercase()),
            None => (ID_SEGMENT.captures(url.path())?[1].to_string(), "jpg".to_string()),
        };

        Some(MediaTarget {
            download_url: url.to_string(),
            media_id,
            default_extension,
        })
    }
}

/// Gfycat `.gif` links, rewritten to the full-resolution host.
pub struct GfycatRule;

impl MediaRule for GfycatRule {
    fn name(&self) -> &'static str {
        "gfycat"
    }

    fn claims(&self, url: &Url) -> bool {
        is_https_host(url, "gfycat.com")
    }

    fn resolve(&self, url: &Url, _submission: &Submission) -> Option<MediaTarget> {
        let (media_id, suffix) = split_file_segment(url)?;
        if suffix != "gif" {
            return None;
        }

        Some(MediaTarget {
            download_url: format!("https://giant.gfycat.com/{}.gif", media_id),
            media_id,
            default_extension: "gif".to_string(),
        })
    }
}
