//! Shared request cache: dedupes requests per [`RequestKey`], remembers the last good value,
//! and runs each network request (with retries) as its own task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::sync::{broadcast, oneshot};
use tokio::time::Instant;

use super::policy::SwrPolicy;
use crate::error::FetchError;
use crate::fetcher::{Fetcher, RequestKey};

/// Outcome of one (possibly retried) request, shared by every waiter.
pub type FetchResult = Result<Arc<Value>, FetchError>;

/// Handle on a request's outcome; cloning it never issues another request.
pub type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Last successful payload for a key.
#[derive(Debug, Clone)]
pub struct CachedValue {
    pub data: Arc<Value>,
    pub fetched_at: Instant,
    ticket: u64,
}

/// A value the cache accepted for `key`, published to every resource mounted on it.
#[derive(Debug, Clone)]
pub struct CacheUpdate {
    pub key: RequestKey,
    pub data: Arc<Value>,
}

struct InFlight {
    ticket: u64,
    result: SharedFetch,
}

#[derive(Default)]
struct Entry {
    value: Option<CachedValue>,
    in_flight: Option<InFlight>,
    /// Start of the last request that did not fail; drives the dedupe window.
    started_at: Option<Instant>,
}

struct CacheInner {
    fetcher: Fetcher,
    policy: SwrPolicy,
    entries: DashMap<RequestKey, Entry>,
    next_ticket: AtomicU64,
    /// Tickets at or below this were issued before the last `clear` and never write back.
    cleared_through: AtomicU64,
    focus: broadcast::Sender<()>,
    updates: broadcast::Sender<CacheUpdate>,
}

/// Stale-while-revalidate cache shared by all resources of one dashboard.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SwrCache {
    inner: Arc<CacheInner>,
}

impl SwrCache {
    pub fn new(fetcher: Fetcher, policy: SwrPolicy) -> Self {
        let (focus, _) = broadcast::channel(16);
        let (updates, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                policy,
                entries: DashMap::new(),
                next_ticket: AtomicU64::new(0),
                cleared_through: AtomicU64::new(0),
                focus,
                updates,
            }),
        }
    }

    pub fn policy(&self) -> &SwrPolicy {
        &self.inner.policy
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.inner.fetcher
    }

    /// Last successful value for `key`, fresh or stale.
    pub fn peek(&self, key: &RequestKey) -> Option<CachedValue> {
        self.inner.entries.get(key).and_then(|e| e.value.clone())
    }

    /// Cached value that a non-forced request would return right now without waiting:
    /// nothing in flight and the last request started within the dedupe window.
    pub fn fresh(&self, key: &RequestKey) -> Option<CachedValue> {
        let entry = self.inner.entries.get(key)?;
        if entry.in_flight.is_some() || !self.dedupes(&entry, Instant::now()) {
            return None;
        }
        entry.value.clone()
    }

    /// Whether a non-forced request for `key` right now would be served without the network.
    pub fn is_deduped(&self, key: &RequestKey) -> bool {
        self.inner
            .entries
            .get(key)
            .is_some_and(|e| self.dedupes(&e, Instant::now()))
    }

    fn dedupes(&self, entry: &Entry, now: Instant) -> bool {
        if entry.in_flight.is_some() {
            return true;
        }
        match (&entry.value, entry.started_at) {
            (Some(_), Some(started)) => {
                now.saturating_duration_since(started) < self.inner.policy.deduping_interval
            }
            _ => false,
        }
    }

    /// Requests `key`.
    ///
    /// Unless `force` is set, a request in flight is joined and a value whose request started
    /// within the dedupe window is returned without touching the network. A forced request
    /// always issues a new call; the call it replaces still completes but can no longer
    /// overwrite the newer cached value.
    pub fn request(&self, key: &RequestKey, force: bool) -> SharedFetch {
        let now = Instant::now();
        let mut entry = self.inner.entries.entry(key.clone()).or_default();
        if !force && self.dedupes(&entry, now) {
            if let Some(in_flight) = &entry.in_flight {
                tracing::debug!(%key, "joining in-flight request");
                return in_flight.result.clone();
            }
            if let Some(value) = &entry.value {
                tracing::debug!(%key, "dedupe window hit");
                return future::ready(Ok(value.data.clone())).boxed().shared();
            }
        }

        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = oneshot::channel::<FetchResult>();
        let result = rx
            .map(|r| {
                r.unwrap_or_else(|_| Err(FetchError::Transport("request task dropped".into())))
            })
            .boxed()
            .shared();
        entry.in_flight = Some(InFlight {
            ticket,
            result: result.clone(),
        });
        entry.started_at = Some(now);
        drop(entry);

        let inner = self.inner.clone();
        let key = key.clone();
        tokio::spawn(async move {
            let outcome = inner.fetch_with_retry(&key).await;
            inner.settle(&key, ticket, &outcome);
            let _ = tx.send(outcome);
        });
        result
    }

    /// Forgets the dedupe window for `key`; the cached value stays available for stale reads.
    pub fn invalidate(&self, key: &RequestKey) {
        if let Some(mut entry) = self.inner.entries.get_mut(key) {
            entry.started_at = None;
        }
    }

    /// Drops every entry. Requests in flight still complete but write nothing back.
    pub fn clear(&self) {
        let issued = self.inner.next_ticket.load(Ordering::SeqCst);
        self.inner.cleared_through.fetch_max(issued, Ordering::SeqCst);
        self.inner.entries.clear();
    }

    /// Host regained focus. Mounted resources revalidate only when the policy asks for it.
    pub fn notify_focus(&self) {
        if self.inner.policy.revalidate_on_focus {
            tracing::debug!("focus regained, revalidating");
            let _ = self.inner.focus.send(());
        }
    }

    pub(crate) fn focus_events(&self) -> broadcast::Receiver<()> {
        self.inner.focus.subscribe()
    }

    pub(crate) fn updates(&self) -> broadcast::Receiver<CacheUpdate> {
        self.inner.updates.subscribe()
    }
}

impl CacheInner {
    async fn fetch_with_retry(&self, key: &RequestKey) -> FetchResult {
        self.policy
            .retry_policy()
            .run(|| self.fetcher.fetch_json(key))
            .await
            .map(Arc::new)
    }

    /// Writes the outcome of request `ticket` back. Older tickets never replace newer values.
    fn settle(&self, key: &RequestKey, ticket: u64, outcome: &FetchResult) {
        if ticket <= self.cleared_through.load(Ordering::SeqCst) {
            tracing::debug!(%key, ticket, "dropping response issued before clear");
            return;
        }
        let Some(mut entry) = self.entries.get_mut(key) else {
            return;
        };
        let latest = entry.in_flight.as_ref().is_some_and(|f| f.ticket == ticket);
        if latest {
            entry.in_flight = None;
        }
        match outcome {
            Ok(data) => {
                if entry.value.as_ref().map_or(true, |v| v.ticket < ticket) {
                    entry.value = Some(CachedValue {
                        data: data.clone(),
                        fetched_at: Instant::now(),
                        ticket,
                    });
                    drop(entry);
                    let _ = self.updates.send(CacheUpdate {
                        key: key.clone(),
                        data: data.clone(),
                    });
                }
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "request failed");
                if latest {
                    entry.started_at = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{HttpClient, HttpResponse};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpClient for CountingClient {
        async fn get(&self, _url: &str) -> Result<HttpResponse, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(HttpResponse::ok(format!(r#"{{"n":{}}}"#, n)))
        }
    }

    fn cache() -> (SwrCache, Arc<CountingClient>) {
        let client = Arc::new(CountingClient {
            calls: AtomicUsize::new(0),
        });
        let fetcher = Fetcher::with_client("http://api", client.clone());
        (SwrCache::new(fetcher, SwrPolicy::default()), client)
    }

    #[tokio::test(start_paused = true)]
    async fn joins_in_flight_and_reuses_fresh_value() {
        let (cache, client) = cache();
        let key = RequestKey::new("/widgets").param("year", 2024);

        let a = cache.request(&key, false);
        let b = cache.request(&key, false);
        let (a, b) = tokio::join!(a, b);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));

        let c = cache.request(&key, false).await.unwrap();
        assert_eq!(c["n"], 1);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_deduped(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn window_expiry_and_force_issue_new_calls() {
        let (cache, client) = cache();
        let key = RequestKey::new("/widgets");

        cache.request(&key, false).await.unwrap();
        let forced = cache.request(&key, true).await.unwrap();
        assert_eq!(forced["n"], 2);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(!cache.is_deduped(&key));
        let after = cache.request(&key, false).await.unwrap();
        assert_eq!(after["n"], 3);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_keeps_value_but_reopens_window() {
        let (cache, client) = cache();
        let key = RequestKey::new("/widgets");
        cache.request(&key, false).await.unwrap();

        cache.invalidate(&key);
        assert!(cache.peek(&key).is_some());
        cache.request(&key, false).await.unwrap();
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn focus_is_silent_when_policy_disables_it() {
        let (cache, _client) = cache();
        let mut rx = cache.focus_events();
        cache.notify_focus();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    /// Answers `(delay_ms, status, body)` steps in call order.
    struct StepClient {
        steps: std::sync::Mutex<std::collections::VecDeque<(u64, u16, &'static str)>>,
    }

    impl StepClient {
        fn new(steps: Vec<(u64, u16, &'static str)>) -> Arc<Self> {
            Arc::new(Self {
                steps: std::sync::Mutex::new(steps.into()),
            })
        }
    }

    #[async_trait]
    impl HttpClient for StepClient {
        async fn get(&self, _url: &str) -> Result<HttpResponse, FetchError> {
            let (delay, status, body) = self.steps.lock().unwrap().pop_front().unwrap();
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(HttpResponse::new(status, body))
        }
    }

    fn no_retry(client: Arc<StepClient>) -> SwrCache {
        let policy = SwrPolicy {
            error_retry_count: 0,
            ..SwrPolicy::default()
        };
        SwrCache::new(Fetcher::with_client("http://api", client), policy)
    }

    #[tokio::test(start_paused = true)]
    async fn clear_drops_responses_issued_before_it() {
        let cache = no_retry(StepClient::new(vec![
            (100, 200, r#""pre-clear""#),
            (10, 500, "down"),
        ]));
        let key = RequestKey::new("/widgets");

        let before = cache.request(&key, false);
        tokio::task::yield_now().await;
        cache.clear();
        assert!(cache.peek(&key).is_none());

        let after = cache.request(&key, false).await;
        assert!(after.is_err());

        // The waiter still gets its answer; the cache does not.
        assert_eq!(*before.await.unwrap(), Value::from("pre-clear"));
        assert!(cache.peek(&key).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_values_are_published_per_key() {
        let cache = no_retry(StepClient::new(vec![
            (50, 200, r#""old""#),
            (10, 200, r#""new""#),
        ]));
        let key = RequestKey::new("/widgets");
        let mut updates = cache.updates();

        let slow = cache.request(&key, false);
        let fast = cache.request(&key, true);
        fast.await.unwrap();
        slow.await.unwrap();

        let update = updates.try_recv().unwrap();
        assert_eq!(update.key, key);
        assert_eq!(*update.data, Value::from("new"));
        assert!(
            matches!(updates.try_recv(), Err(broadcast::error::TryRecvError::Empty)),
            "a superseded response is not published"
        );
    }
}
