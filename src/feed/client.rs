//! Feed client abstraction and the Reddit HTTP client.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};

use crate::error::{Error, Result};
use crate::feed::types::{Listing, Submission, TimeWindow};

/// Reddit base URL for public JSON listings.
pub const REDDIT_BASE: &str = "https://www.reddit.com";

/// Source of feed submissions.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch the top `limit` submissions of `feed` within `window`.
    ///
    /// Temporary unavailability is reported as [`Error::FeedUnavailable`] or
    /// [`Error::RateLimited`].
    async fn top(&self, feed: &str, window: TimeWindow, limit: usize) -> Result<Vec<Submission>>;
}

/// Client for public subreddit listings.
pub struct RedditClient {
    client: Client,
    base_url: String,
}

impl RedditClient {
    /// Create a client identifying itself with `user_agent`.
    pub fn new(user_agent: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Share an existing HTTP client (and its connection pool).
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FeedClient for RedditClient {
    async fn top(&self, feed: &str, window: TimeWindow, limit: usize) -> Result<Vec<Submission>> {
        let url = format!("{}/r/{}/top.json", self.base_url, feed);
        tracing::debug!("GET {} (t={}, limit={})", url, window, limit);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("t", window.as_str().to_string()),
                ("limit", limit.to_string()),
                ("raw_json", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    Error::FeedUnavailable(e.to_string())
                } else {
                    Error::Http(e)
                }
            })?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(60);
            return Err(Error::RateLimited(retry_after));
        }

        if status.is_server_error() {
            return Err(Error::FeedUnavailable(format!("HTTP {} for r/{}", status, feed)));
        }

        if !status.is_success() {
            return Err(Error::Api(format!("HTTP {} for r/{}", status, feed)));
        }

        let text = response.text().await?;
        let listing: Listing = serde_json::from_str(&text).map_err(|e| {
            Error::Api(format!(
                "Failed to parse listing: {} - Response: {}",
                e,
                text.chars().take(500).collect::<String>()
            ))
        })?;

        let mut submissions: Vec<Submission> =
            listing.data.children.into_iter().map(|c| c.data).collect();
        submissions.truncate(limit);

        Ok(submissions)
    }
}
