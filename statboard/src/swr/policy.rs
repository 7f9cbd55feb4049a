//! Stale-while-revalidate policy and the bounded fixed-interval retry it implies.

use std::future::Future;
use std::time::Duration;

use env_config::SwrSettings;

use crate::error::FetchError;

/// Fetch policy applied uniformly by a [`super::SwrCache`] to every resource it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwrPolicy {
    /// Non-forced requests for a key whose last request started within this window reuse
    /// the in-flight request or the cached value.
    pub deduping_interval: Duration,
    /// Revalidate mounted resources on [`super::SwrCache::notify_focus`].
    pub revalidate_on_focus: bool,
    /// Serve a stale cached value immediately and refresh it in the background. When off, a
    /// cached value is served as-is on mount.
    pub revalidate_if_stale: bool,
    /// Retries after the first failed attempt.
    pub error_retry_count: u32,
    /// Fixed spacing between attempts.
    pub error_retry_interval: Duration,
    /// On key change, keep the previous data visible until the new key settles.
    pub keep_previous_data: bool,
}

impl SwrPolicy {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.error_retry_count.saturating_add(1),
            interval: self.error_retry_interval,
        }
    }
}

impl Default for SwrPolicy {
    fn default() -> Self {
        Self::from(&SwrSettings::default())
    }
}

impl From<&SwrSettings> for SwrPolicy {
    fn from(s: &SwrSettings) -> Self {
        Self {
            deduping_interval: Duration::from_millis(s.deduping_interval_ms),
            revalidate_on_focus: s.revalidate_on_focus,
            revalidate_if_stale: s.revalidate_if_stale,
            error_retry_count: s.error_retry_count,
            error_retry_interval: Duration::from_millis(s.error_retry_interval_ms),
            keep_previous_data: s.keep_previous_data,
        }
    }
}

/// Bounded retry with fixed backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; at least 1.
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            interval: Duration::ZERO,
        }
    }

    /// Runs `op` until it succeeds or `max_attempts` is reached, sleeping `interval` between
    /// attempts. Returns the last error.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.max_attempts && e.is_retryable() => {
                    tracing::warn!(attempt, max_attempts = self.max_attempts, error = %e, "request failed, retrying");
                    tokio::time::sleep(self.interval).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn defaults_match_settings_defaults() {
        let p = SwrPolicy::default();
        assert_eq!(p.deduping_interval, Duration::from_secs(60));
        assert!(!p.revalidate_on_focus);
        assert!(p.revalidate_if_stale);
        assert_eq!(p.error_retry_count, 3);
        assert_eq!(p.error_retry_interval, Duration::from_secs(5));
        assert!(p.keep_previous_data);
        assert_eq!(p.retry_policy().max_attempts, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_after_max_attempts_with_fixed_spacing() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            interval: Duration::from_secs(2),
        };
        let start = tokio::time::Instant::now();
        let result: Result<(), _> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::Transport("down".into())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn none_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<u8, _> = RetryPolicy::none()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::Decode("bad".into())) }
            })
            .await;
        assert_eq!(result, Err(FetchError::Decode("bad".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
