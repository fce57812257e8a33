//! Feed data types and Reddit listing response definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One item returned by a feed poll.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Submission {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub media: Option<SubmissionMedia>,
}

impl Submission {
    /// Embedded Reddit video metadata, if present.
    pub fn reddit_video(&self) -> Option<&RedditVideo> {
        self.media.as_ref()?.reddit_video.as_ref()
    }
}

/// Structured media metadata attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmissionMedia {
    #[serde(default)]
    pub reddit_video: Option<RedditVideo>,
}

/// Reddit-hosted video description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RedditVideo {
    /// Set for silent, gif-style videos.
    #[serde(default)]
    pub is_gif: bool,
    #[serde(default)]
    pub fallback_url: String,
}

/// Listing wrapper: `{"kind": "Listing", "data": {...}}`.
#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<ListingChild>,
}

/// Listing entry: `{"kind": "t3", "data": {...submission...}}`.
#[derive(Debug, Deserialize)]
pub struct ListingChild {
    pub data: Submission,
}

/// Time window of a "top" listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Hour => "hour",
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Year => "year",
            TimeWindow::All => "all",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hour" => Ok(TimeWindow::Hour),
            "day" => Ok(TimeWindow::Day),
            "week" => Ok(TimeWindow::Week),
            "month" => Ok(TimeWindow::Month),
            "year" => Ok(TimeWindow::Year),
            "all" => Ok(TimeWindow::All),
            _ => Err(format!("Unknown time window: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "after": null,
                "children": [
                    {"kind": "t3", "data": {
                        "id": "abc123",
                        "url": "https://i.imgur.com/xyz.gif",
                        "title": "A cat",
                        "media": null,
                        "score": 1200
                    }},
                    {"kind": "t3", "data": {
                        "id": "def456",
                        "url": "https://v.redd.it/vid1",
                        "title": "A loop",
                        "media": {"reddit_video": {
                            "is_gif": true,
                            "fallback_url": "https://v.redd.it/vid1/DASH_480.mp4",
                            "height": 480
                        }}
                    }}
                ]
            }
        }"#;

        let listing: Listing = serde_json::from_str(json).unwrap();
        let submissions: Vec<Submission> =
            listing.data.children.into_iter().map(|c| c.data).collect();

        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].id, "abc123");
        assert!(submissions[0].reddit_video().is_none());

        let video = submissions[1].reddit_video().unwrap();
        assert!(video.is_gif);
        assert_eq!(video.fallback_url, "https://v.redd.it/vid1/DASH_480.mp4");
    }

    #[test]
    fn test_media_without_video() {
        let json = r#"{"id": "x", "url": "u", "title": "t", "media": {"oembed": {}}}"#;
        let submission: Submission = serde_json::from_str(json).unwrap();
        assert!(submission.reddit_video().is_none());
    }

    #[test]
    fn test_time_window_parse() {
        assert_eq!("DAY".parse::<TimeWindow>().unwrap(), TimeWindow::Day);
        assert_eq!(TimeWindow::default().to_string(), "day");
        assert!("decade".parse::<TimeWindow>().is_err());
    }
}
