//! Feed browse loop.
//!
//! A [`Browser`] owns one background task that alternates between two phases:
//!
//! - **POLL**: snapshot the configuration, expire old reposts, fetch the top
//!   listing and repost every new submission with resolvable media.
//! - **WAIT**: sleep in steps of at most [`WAIT_STEP`] until `browse_delay`
//!   has passed since the poll started, checking for cancellation at each step.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::browser::config::BrowserConfig;
use crate::browser::correlator::DeliveryCorrelator;
use crate::browser::policy::{FetchPolicy, NoRetry};
use crate::config::{validate_delay, validate_feed_name, validate_top_num};
use crate::download::DownloadManager;
use crate::error::{Error, Result};
use crate::feed::{FeedClient, Submission};
use crate::fs::ensure_dir;
use crate::media::MediaResolver;
use crate::stats::{Action, StatsRecorder, StatsSnapshot};
use crate::store::{KeyValueStore, RetentionStore};
use crate::transport::{MessagingTransport, SubscriptionId};

/// Longest uninterrupted sleep of the WAIT phase.
pub const WAIT_STEP: Duration = Duration::from_secs(10);

/// Observable state of a browse loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserStatus {
    /// Started, first poll not begun.
    Starting,
    Polling,
    Waiting,
    /// The last poll was aborted by a storage error. Cleared by the next successful poll.
    Failed { reason: String },
    Stopped,
}

impl BrowserStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, BrowserStatus::Failed { .. })
    }
}

/// Collaborators of a browse loop.
pub struct BrowserDeps {
    pub feed: Arc<dyn FeedClient>,
    pub transport: Arc<dyn MessagingTransport>,
    pub store: Arc<dyn KeyValueStore>,
    pub downloader: DownloadManager,
    pub resolver: Option<MediaResolver>,
    pub fetch_policy: Arc<dyn FetchPolicy>,
}

impl BrowserDeps {
    pub fn new(
        feed: Arc<dyn FeedClient>,
        transport: Arc<dyn MessagingTransport>,
        store: Arc<dyn KeyValueStore>,
        downloader: DownloadManager,
    ) -> Self {
        Self {
            feed,
            transport,
            store,
            downloader,
            resolver: None,
            fetch_policy: Arc::new(NoRetry),
        }
    }

    /// Use a custom resolver instead of the built-in provider table.
    ///
    /// Its temporary directory must match the browser's `tmp_dir`, otherwise
    /// deliveries are not correlated.
    pub fn with_resolver(mut self, resolver: MediaResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_fetch_policy(mut self, policy: Arc<dyn FetchPolicy>) -> Self {
        self.fetch_policy = policy;
        self
    }
}

/// State shared between the control surface and the loop task.
struct Shared {
    config: RwLock<BrowserConfig>,
    /// Held across feed fetches and feed renames.
    feed_lock: tokio::sync::Mutex<()>,
    status: RwLock<BrowserStatus>,
}

impl Shared {
    async fn set_status(&self, status: BrowserStatus) {
        *self.status.write().await = status;
    }

    /// Move to `status` unless a failure is pending.
    async fn advance(&self, status: BrowserStatus) {
        let mut current = self.status.write().await;
        if !current.is_failed() {
            *current = status;
        }
    }
}

/// Reposts media from one feed into one channel.
pub struct Browser {
    shared: Arc<Shared>,
    transport: Arc<dyn MessagingTransport>,
    stats: StatsRecorder,
    subscription: Mutex<Option<SubscriptionId>>,
    token: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Browser {
    /// Create the temporary directory, register for delivery confirmations
    /// and start the loop.
    ///
    /// Storage keys are namespaced by the initial feed and channel names.
    pub async fn start(config: BrowserConfig, deps: BrowserDeps) -> Result<Self> {
        ensure_dir(&config.tmp_dir).await?;

        let prefix = config.key_prefix();
        let retention = RetentionStore::new(deps.store.clone(), &prefix);
        let stats = StatsRecorder::new(deps.store.clone(), &prefix);

        let correlator = Arc::new(DeliveryCorrelator::new(
            &config.channel_name,
            &config.tmp_dir,
            stats.clone(),
        ));
        let subscription = deps.transport.subscribe(correlator).await;

        let resolver = deps
            .resolver
            .unwrap_or_else(|| MediaResolver::new(config.tmp_dir.clone()));

        tracing::info!(
            "Starting browser r/{} -> {} (top {} every {}s)",
            config.feed_name,
            config.channel_name,
            config.top_num,
            config.browse_delay.as_secs()
        );

        let shared = Arc::new(Shared {
            config: RwLock::new(config),
            feed_lock: tokio::sync::Mutex::new(()),
            status: RwLock::new(BrowserStatus::Starting),
        });
        let token = CancellationToken::new();

        let poller = Poller {
            shared: shared.clone(),
            feed: deps.feed,
            transport: deps.transport.clone(),
            resolver,
            downloader: deps.downloader,
            retention,
            stats: stats.clone(),
            policy: deps.fetch_policy,
            token: token.clone(),
        };
        let handle = tokio::spawn(poller.run());

        Ok(Self {
            shared,
            transport: deps.transport,
            stats,
            subscription: Mutex::new(Some(subscription)),
            token,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Current configuration.
    pub async fn config(&self) -> BrowserConfig {
        self.shared.config.read().await.clone()
    }

    pub async fn top_num(&self) -> usize {
        self.shared.config.read().await.top_num
    }

    /// Applies from the next poll.
    pub async fn set_top_num(&self, top_num: usize) -> Result<()> {
        validate_top_num(top_num)?;
        self.shared.config.write().await.top_num = top_num;
        tracing::info!("Top entries number changed to {}", top_num);
        Ok(())
    }

    pub async fn browse_delay(&self) -> Duration {
        self.shared.config.read().await.browse_delay
    }

    /// Applies from the next poll.
    pub async fn set_browse_delay(&self, delay: Duration) -> Result<()> {
        validate_delay("browse_delay", delay.as_secs())?;
        self.shared.config.write().await.browse_delay = delay;
        tracing::info!("Browse delay changed to {}s", delay.as_secs());
        Ok(())
    }

    pub async fn feed_name(&self) -> String {
        self.shared.config.read().await.feed_name.clone()
    }

    /// Switch to another feed. Waits for an in-flight fetch; applies from the next poll.
    pub async fn set_feed_name(&self, name: &str) -> Result<()> {
        validate_feed_name(name)?;
        let _feed = self.shared.feed_lock.lock().await;
        self.shared.config.write().await.feed_name = name.to_string();
        tracing::info!("Feed changed to r/{}", name);
        Ok(())
    }

    pub async fn status(&self) -> BrowserStatus {
        self.shared.status.read().await.clone()
    }

    pub fn is_running(&self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        match self.handle.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|h| !h.is_finished()),
            Err(_) => false,
        }
    }

    /// Sent and delivered statistics of this pipeline.
    pub async fn stats(&self) -> Result<StatsSnapshot> {
        Ok(self.stats.snapshot().await?)
    }

    /// Unsubscribe from confirmations, cancel the loop and wait for it to exit.
    pub async fn stop(&self) {
        let subscription = match self.subscription.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(id) = subscription {
            self.transport.unsubscribe(id).await;
        }

        self.token.cancel();

        let handle = match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Browser task failed: {}", e);
            }
            let config = self.shared.config.read().await;
            tracing::info!(
                "Stopped browser r/{} -> {}",
                config.feed_name,
                config.channel_name
            );
        }

        self.shared.set_status(BrowserStatus::Stopped).await;
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        self.token.cancel();

        let subscription = match self.subscription.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(id) = subscription else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let transport = self.transport.clone();
                runtime.spawn(async move {
                    transport.unsubscribe(id).await;
                });
            }
            Err(_) => tracing::warn!("Browser dropped outside a runtime, listener left registered"),
        }
    }
}

/// The loop task.
pub(crate) struct Poller {
    shared: Arc<Shared>,
    feed: Arc<dyn FeedClient>,
    transport: Arc<dyn MessagingTransport>,
    resolver: MediaResolver,
    downloader: DownloadManager,
    retention: RetentionStore,
    stats: StatsRecorder,
    policy: Arc<dyn FetchPolicy>,
    token: CancellationToken,
}

impl Poller {
    async fn run(self) {
        tracing::debug!("Browser loop started");

        while !self.token.is_cancelled() {
            let started = Instant::now();
            let config = self.shared.config.read().await.clone();

            self.poll_and_report(&config).await;

            if !self.wait(started, config.browse_delay).await {
                break;
            }
        }

        self.shared.set_status(BrowserStatus::Stopped).await;
        tracing::debug!("Browser loop finished");
    }

    /// Run one poll and publish its outcome in the status.
    async fn poll_and_report(&self, config: &BrowserConfig) {
        self.shared.advance(BrowserStatus::Polling).await;

        match self.poll(config).await {
            Ok(dispatched) => {
                tracing::debug!("Poll of r/{} dispatched {} submission(s)", config.feed_name, dispatched);
                self.shared.set_status(BrowserStatus::Waiting).await;
            }
            Err(e) => {
                tracing::error!("Poll of r/{} aborted: {}", config.feed_name, e);
                self.shared
                    .set_status(BrowserStatus::Failed {
                        reason: e.to_string(),
                    })
                    .await;
            }
        }
    }

    /// Sleep until `delay` has passed since `since`. Returns false when cancelled.
    async fn wait(&self, since: Instant, delay: Duration) -> bool {
        loop {
            let elapsed = since.elapsed();
            if elapsed >= delay {
                return true;
            }

            let step = (delay - elapsed).min(WAIT_STEP);
            tokio::select! {
                _ = self.token.cancelled() => return false,
                _ = tokio::time::sleep(step) => {}
            }
        }
    }

    /// One POLL phase. Returns the number of dispatched submissions.
    ///
    /// Storage errors abort the poll.
    pub(crate) async fn poll(&self, config: &BrowserConfig) -> Result<usize> {
        let expired = self.retention.sweep(config.cleanup_delay, Utc::now()).await?;
        if expired > 0 {
            tracing::debug!("Forgot {} reposted submission(s)", expired);
        }

        let submissions = self.fetch(config).await;
        let mut dispatched = 0;

        for submission in &submissions {
            if self.token.is_cancelled() {
                tracing::debug!("Stop requested, leaving poll early");
                break;
            }

            if self.repost(config, submission).await? {
                dispatched += 1;
            }
        }

        Ok(dispatched)
    }

    /// Fetch the listing under the feed lock. Feed errors yield no submissions.
    async fn fetch(&self, config: &BrowserConfig) -> Vec<Submission> {
        let _feed = self.shared.feed_lock.lock().await;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self
                .feed
                .top(&config.feed_name, config.top_window, config.top_num)
                .await
            {
                Ok(submissions) => {
                    tracing::debug!(
                        "Fetched {} submission(s) from r/{}",
                        submissions.len(),
                        config.feed_name
                    );
                    return submissions;
                }
                Err(e) => e,
            };

            let Some(delay) = self.policy.retry_after(attempt, &error) else {
                if error.is_transient() {
                    tracing::warn!("r/{} unavailable: {}", config.feed_name, error);
                } else {
                    tracing::error!("Failed to fetch r/{}: {}", config.feed_name, error);
                }
                return Vec::new();
            };

            tracing::warn!(
                "Fetching r/{} failed ({}), retrying in {}s",
                config.feed_name,
                error,
                delay.as_secs()
            );
            tokio::select! {
                _ = self.token.cancelled() => return Vec::new(),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Repost one submission. Returns whether it was dispatched.
    async fn repost(&self, config: &BrowserConfig, submission: &Submission) -> Result<bool> {
        if self.retention.is_posted(&submission.id).await? {
            tracing::debug!("Skipping {}: already posted", submission.id);
            return Ok(false);
        }

        let Some(target) = self.resolver.resolve(submission) else {
            return Ok(false);
        };

        let media = match self
            .downloader
            .download(&target.download_url, &target.base_path, &target.default_extension)
            .await
        {
            Ok(media) => media,
            Err(e) => {
                tracing::warn!(
                    "Failed to download {} for {}: {}",
                    target.download_url,
                    submission.id,
                    e
                );
                return Ok(false);
            }
        };

        if let Err(e) = self.retention.mark_posted(&submission.id, Utc::now()).await {
            discard(&media.path).await;
            return Err(Error::Storage(e));
        }

        let accepted = match self
            .transport
            .send_media(&media.path, media.kind, &config.channel_name, &submission.title)
            .await
        {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!("Failed to send {}: {}", media.path.display(), e);
                false
            }
        };

        if !accepted {
            tracing::warn!(
                "{} was not accepted for {}, dropping it",
                media.path.display(),
                config.channel_name
            );
            discard(&media.path).await;
            return Ok(false);
        }

        self.stats
            .record(Action::Sent, media.kind, media.size, Local::now())
            .await?;

        tracing::info!(
            "Reposted {} ({}) from r/{} to {}",
            submission.id,
            media.kind,
            config.feed_name,
            config.channel_name
        );

        Ok(true)
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
