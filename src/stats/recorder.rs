//! Repost statistics kept in keyed storage.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Days, Local, NaiveDate};
use serde::Serialize;

use crate::error::Result;
use crate::media::MediaKind;
use crate::store::{KeyValueStore, StoreResult};

/// Number of days reported by [`StatsRecorder::last_7_days`].
pub const WEEK_DAYS: u64 = 7;

/// Recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Handed to the messaging transport.
    Sent,
    /// Confirmed delivered by the messaging transport.
    Delivered,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Sent => "sent",
            Action::Delivered => "delivered",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Count and byte size for one media kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindTotals {
    pub count: u64,
    pub size: u64,
}

/// Per-kind and grand totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatTotals {
    pub by_kind: BTreeMap<MediaKind, KindTotals>,
    pub total: u64,
    pub total_size: u64,
}

impl StatTotals {
    /// Totals for one kind (zero when nothing was recorded).
    pub fn kind(&self, kind: MediaKind) -> KindTotals {
        self.by_kind.get(&kind).copied().unwrap_or_default()
    }
}

/// Totals of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStats {
    pub date: NaiveDate,
    pub totals: StatTotals,
}

/// Totals, today and the last week for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionStats {
    pub totals: StatTotals,
    pub today: StatTotals,
    pub week: Vec<DayStats>,
}

/// Statistics for both actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub sent: ActionStats,
    pub delivered: ActionStats,
}

/// Records and queries repost statistics under a key prefix.
///
/// Keys per action: `{prefix}_total_{action}` and `{prefix}_total_size_{action}`
/// (field: kind), `{prefix}_date_{action}` and `{prefix}_date_size_{action}`
/// (field: `{YYYY-MM-DD}_{kind}`).
#[derive(Clone)]
pub struct StatsRecorder {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl StatsRecorder {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: &str) -> Self {
        Self {
            store,
            prefix: prefix.to_string(),
        }
    }

    fn key(&self, name: &str, action: Action) -> String {
        format!("{}_{}_{}", self.prefix, name, action.as_str())
    }

    /// Record one event of `kind` weighing `size` bytes at `at`.
    pub async fn record(
        &self,
        action: Action,
        kind: MediaKind,
        size: u64,
        at: DateTime<Local>,
    ) -> StoreResult<()> {
        let day_field = format!("{}_{}", at.date_naive(), kind.as_str());
        let size = i64::try_from(size).unwrap_or(i64::MAX);

        tracing::debug!(
            "Recording media statistics: type - {}, size - {}, date - {}, action - {}",
            kind,
            size,
            at.date_naive(),
            action
        );

        self.store
            .hincrby(&self.key("total", action), kind.as_str(), 1)
            .await?;
        self.store
            .hincrby(&self.key("total_size", action), kind.as_str(), size)
            .await?;
        self.store
            .hincrby(&self.key("date", action), &day_field, 1)
            .await?;
        self.store
            .hincrby(&self.key("date_size", action), &day_field, size)
            .await?;

        Ok(())
    }

    /// Record an event for a local file, using its extension and current size.
    ///
    /// Returns the recorded size.
    pub async fn record_file(&self, action: Action, path: &Path) -> Result<u64> {
        let size = tokio::fs::metadata(path).await?.len();
        self.record(action, MediaKind::from_path(path), size, Local::now())
            .await?;
        Ok(size)
    }

    /// Lifetime totals.
    pub async fn totals(&self, action: Action) -> StoreResult<StatTotals> {
        self.collect(&self.key("total", action), &self.key("total_size", action), "")
            .await
    }

    /// Totals of a given calendar day.
    pub async fn day(&self, action: Action, date: NaiveDate) -> StoreResult<StatTotals> {
        self.collect(
            &self.key("date", action),
            &self.key("date_size", action),
            &format!("{}_", date),
        )
        .await
    }

    /// Totals of the current local day.
    pub async fn today(&self, action: Action) -> StoreResult<StatTotals> {
        self.day(action, Local::now().date_naive()).await
    }

    /// Seven days ending today, oldest first.
    pub async fn last_7_days(&self, action: Action) -> StoreResult<Vec<DayStats>> {
        self.week_ending(action, Local::now().date_naive()).await
    }

    /// Seven days ending on `last`, oldest first, zero-filled.
    pub async fn week_ending(&self, action: Action, last: NaiveDate) -> StoreResult<Vec<DayStats>> {
        let mut days = Vec::with_capacity(WEEK_DAYS as usize);
        for offset in (0..WEEK_DAYS).rev() {
            let date = last.checked_sub_days(Days::new(offset)).unwrap_or(last);
            days.push(DayStats {
                date,
                totals: self.day(action, date).await?,
            });
        }
        Ok(days)
    }

    /// Totals, today and week for one action.
    pub async fn action_stats(&self, action: Action) -> StoreResult<ActionStats> {
        Ok(ActionStats {
            totals: self.totals(action).await?,
            today: self.today(action).await?,
            week: self.last_7_days(action).await?,
        })
    }

    /// Full statistics snapshot.
    pub async fn snapshot(&self) -> StoreResult<StatsSnapshot> {
        Ok(StatsSnapshot {
            sent: self.action_stats(Action::Sent).await?,
            delivered: self.action_stats(Action::Delivered).await?,
        })
    }

    async fn collect(
        &self,
        count_key: &str,
        size_key: &str,
        field_prefix: &str,
    ) -> StoreResult<StatTotals> {
        let mut totals = StatTotals::default();

        for kind in MediaKind::ALL {
            let field = format!("{}{}", field_prefix, kind.as_str());
            let entry = KindTotals {
                count: self.counter(count_key, &field).await?,
                size: self.counter(size_key, &field).await?,
            };

            totals.total += entry.count;
            totals.total_size += entry.size;
            totals.by_kind.insert(kind, entry);
        }

        Ok(totals)
    }

    async fn counter(&self, key: &str, field: &str) -> StoreResult<u64> {
        let raw = self.store.hget(key, field).await?;
        Ok(raw
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|v| v.max(0) as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn recorder() -> (Arc<MemoryStore>, StatsRecorder) {
        let store = Arc::new(MemoryStore::new());
        let recorder = StatsRecorder::new(store.clone(), "aww_@channel");
        (store, recorder)
    }

    fn local(y: i32, m: u32, d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_record_writes_documented_keys() {
        let (store, recorder) = recorder();

        recorder
            .record(Action::Sent, MediaKind::Animation, 2048, local(2024, 3, 9))
            .await
            .unwrap();

        let get = |key: &'static str, field: &'static str| {
            let store = store.clone();
            async move { store.hget(key, field).await.unwrap() }
        };

        assert_eq!(get("aww_@channel_total_sent", "animation").await.as_deref(), Some("1"));
        assert_eq!(
            get("aww_@channel_total_size_sent", "animation").await.as_deref(),
            Some("2048")
        );
        assert_eq!(
            get("aww_@channel_date_sent", "2024-03-09_animation").await.as_deref(),
            Some("1")
        );
        assert_eq!(
            get("aww_@channel_date_size_sent", "2024-03-09_animation")
                .await
                .as_deref(),
            Some("2048")
        );
    }

    #[tokio::test]
    async fn test_totals_by_kind_and_action() {
        let (_, recorder) = recorder();
        let at = local(2024, 3, 9);

        recorder.record(Action::Sent, MediaKind::Image, 100, at).await.unwrap();
        recorder.record(Action::Sent, MediaKind::Image, 50, at).await.unwrap();
        recorder.record(Action::Sent, MediaKind::Video, 1000, at).await.unwrap();
        recorder.record(Action::Delivered, MediaKind::Image, 100, at).await.unwrap();

        let sent = recorder.totals(Action::Sent).await.unwrap();
        assert_eq!(sent.kind(MediaKind::Image), KindTotals { count: 2, size: 150 });
        assert_eq!(sent.kind(MediaKind::Video), KindTotals { count: 1, size: 1000 });
        assert_eq!(sent.kind(MediaKind::Audio), KindTotals::default());
        assert_eq!(sent.total, 3);
        assert_eq!(sent.total_size, 1150);
        assert_eq!(sent.by_kind.len(), MediaKind::ALL.len());

        let delivered = recorder.totals(Action::Delivered).await.unwrap();
        assert_eq!(delivered.total, 1);
    }

    #[tokio::test]
    async fn test_day_buckets_are_separate() {
        let (_, recorder) = recorder();

        recorder
            .record(Action::Sent, MediaKind::Image, 10, local(2024, 3, 8))
            .await
            .unwrap();
        recorder
            .record(Action::Sent, MediaKind::Image, 20, local(2024, 3, 9))
            .await
            .unwrap();

        let day = recorder.day(Action::Sent, date(2024, 3, 9)).await.unwrap();
        assert_eq!(day.total, 1);
        assert_eq!(day.total_size, 20);

        let lifetime = recorder.totals(Action::Sent).await.unwrap();
        assert_eq!(lifetime.total, 2);
    }

    #[tokio::test]
    async fn test_week_is_seven_ascending_zero_filled_days() {
        let (_, recorder) = recorder();

        recorder
            .record(Action::Delivered, MediaKind::Video, 5, local(2024, 3, 1))
            .await
            .unwrap();
        // Outside the window
        recorder
            .record(Action::Delivered, MediaKind::Video, 5, local(2024, 2, 20))
            .await
            .unwrap();

        let week = recorder
            .week_ending(Action::Delivered, date(2024, 3, 2))
            .await
            .unwrap();

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, date(2024, 2, 25));
        assert_eq!(week[6].date, date(2024, 3, 2));
        assert!(week.windows(2).all(|w| w[0].date < w[1].date));

        let active: Vec<_> = week.iter().filter(|d| d.totals.total > 0).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].date, date(2024, 3, 1));
        assert_eq!(week[6].totals.total, 0);
        assert_eq!(week[6].totals.kind(MediaKind::Video), KindTotals::default());
    }

    #[tokio::test]
    async fn test_last_7_days_on_empty_store() {
        let (_, recorder) = recorder();

        let week = recorder.last_7_days(Action::Sent).await.unwrap();
        assert_eq!(week.len(), 7);
        assert_eq!(week[6].date, Local::now().date_naive());
        assert!(week.iter().all(|d| d.totals.total == 0 && d.totals.total_size == 0));
    }

    #[tokio::test]
    async fn test_concurrent_records_are_not_lost() {
        let (_, recorder) = recorder();
        let at = local(2024, 3, 9);

        let handles: Vec<_> = (0..64u64)
            .map(|i| {
                let recorder = recorder.clone();
                let kind = if i % 2 == 0 { MediaKind::Image } else { MediaKind::Video };
                tokio::spawn(async move { recorder.record(Action::Sent, kind, i, at).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let totals = recorder.totals(Action::Sent).await.unwrap();
        assert_eq!(totals.total, 64);
        assert_eq!(totals.total_size, (0..64u64).sum::<u64>());
        assert_eq!(totals.kind(MediaKind::Image).count, 32);

        let day = recorder.day(Action::Sent, date(2024, 3, 9)).await.unwrap();
        assert_eq!(day.total, 64);
    }

    #[tokio::test]
    async fn test_record_file_uses_extension_and_size() {
        let (_, recorder) = recorder();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xyz.gif");
        std::fs::write(&path, b"GIF89a-data").unwrap();

        let size = recorder.record_file(Action::Delivered, &path).await.unwrap();
        assert_eq!(size, 11);

        let today = recorder.today(Action::Delivered).await.unwrap();
        assert_eq!(today.kind(MediaKind::Animation), KindTotals { count: 1, size: 11 });
    }

    #[tokio::test]
    async fn test_record_file_missing_file_is_error() {
        let (_, recorder) = recorder();
        let dir = tempfile::tempdir().unwrap();

        assert!(recorder
            .record_file(Action::Delivered, &dir.path().join("gone.jpg"))
            .await
            .is_err());
        assert_eq!(recorder.totals(Action::Delivered).await.unwrap().total, 0);
    }
}
