//! Retry policies for feed fetches.

use std::time::Duration;

use crate::error::Error;

/// Decides whether a failed feed fetch is retried within the same poll.
pub trait FetchPolicy: Send + Sync {
    /// Delay before retrying after `attempt` failed attempts, or `None` to give up.
    fn retry_after(&self, attempt: u32, error: &Error) -> Option<Duration>;
}

/// Never retry; the next poll tries again.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl FetchPolicy for NoRetry {
    fn retry_after(&self, _attempt: u32, _error: &Error) -> Option<Duration> {
        None
    }
}

/// Retry transient errors a bounded number of times.
///
/// Rate limits wait for the announced interval when it is not longer than `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryTransient {
    pub max_attempts: u32,
    pub delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryTransient {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(120),
        }
    }
}

impl FetchPolicy for RetryTransient {
    fn retry_after(&self, attempt: u32, error: &Error) -> Option<Duration> {
        if attempt >= self.max_attempts || !error.is_transient() {
            return None;
        }

        match error {
            Error::RateLimited(seconds) => {
                let wait = Duration::from_secs(*seconds);
                (wait <= self.max_delay).then_some(wait)
            }
            _ => Some(self.delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_retry() {
        assert_eq!(NoRetry.retry_after(1, &Error::FeedUnavailable("503".into())), None);
    }

    #[test]
    fn test_retry_transient() {
        let policy = RetryTransient::default();
        let unavailable = Error::FeedUnavailable("503".into());

        assert_eq!(policy.retry_after(1, &unavailable), Some(Duration::from_secs(10)));
        assert_eq!(policy.retry_after(2, &unavailable), Some(Duration::from_secs(10)));
        assert_eq!(policy.retry_after(3, &unavailable), None);
        assert_eq!(policy.retry_after(1, &Error::Api("404".into())), None);
    }

    #[test]
    fn test_rate_limit_interval() {
        let policy = RetryTransient::default();

        assert_eq!(
            policy.retry_after(1, &Error::RateLimited(30)),
            Some(Duration::from_secs(30))
        );
        assert_eq!(policy.retry_after(1, &Error::RateLimited(600)), None);
    }
}
