//! Retention tracking of reposted submissions.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::store::kv::{KeyValueStore, StoreResult};

/// Records which submission ids were reposted for one (feed, channel) pair and when.
///
/// Keys: `{prefix}_posted` (set of ids) and `{prefix}_post_time` (hash id → unix seconds).
/// An id present in the set always has a time entry: times are written before
/// membership and removed after it.
#[derive(Clone)]
pub struct RetentionStore {
    store: Arc<dyn KeyValueStore>,
    posted_key: String,
    time_key: String,
}

impl RetentionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: &str) -> Self {
        Self {
            store,
            posted_key: format!("{}_posted", prefix),
            time_key: format!("{}_post_time", prefix),
        }
    }

    /// Check whether a submission id has been reposted and not yet swept.
    pub async fn is_posted(&self, id: &str) -> StoreResult<bool> {
        self.store.sismember(&self.posted_key, id).await
    }

    /// Record a repost. Marking an id again refreshes its time.
    pub async fn mark_posted(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        self.store
            .hset(&self.time_key, id, &encode_time(at))
            .await?;
        self.store.sadd(&self.posted_key, id).await?;
        Ok(())
    }

    /// Time a tracked id was posted.
    pub async fn posted_at(&self, id: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let raw = self.store.hget(&self.time_key, id).await?;
        Ok(raw.as_deref().and_then(decode_time))
    }

    /// Forget every id posted at or before `now - cleanup_delay`.
    ///
    /// Ids whose time entry is missing or unreadable are forgotten as well.
    /// Returns the number of ids removed.
    pub async fn sweep(&self, cleanup_delay: Duration, now: DateTime<Utc>) -> StoreResult<usize> {
        let cutoff = chrono::Duration::from_std(cleanup_delay)
            .ok()
            .and_then(|delay| now.checked_sub_signed(delay));

        let mut expired = Vec::new();
        for id in self.store.smembers(&self.posted_key).await? {
            let is_expired = match (self.posted_at(&id).await?, cutoff) {
                (Some(posted), Some(cutoff)) => posted <= cutoff,
                (Some(_), None) => false,
                (None, _) => true,
            };
            if is_expired {
                expired.push(id);
            }
        }

        for id in &expired {
            self.store.srem(&self.posted_key, id).await?;
            self.store.hdel(&self.time_key, id).await?;
        }

        if !expired.is_empty() {
            tracing::debug!("Swept {} expired ids from {}", expired.len(), self.posted_key);
        }

        Ok(expired.len())
    }
}

fn encode_time(at: DateTime<Utc>) -> String {
    format!("{:.3}", at.timestamp_millis() as f64 / 1000.0)
}

fn decode_time(raw: &str) -> Option<DateTime<Utc>> {
    let seconds: f64 = raw.trim().parse().ok()?;
    if !seconds.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt((seconds * 1000.0).round() as i64)
        .single()
}
