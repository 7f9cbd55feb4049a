//! Async resource: per-call-site `{data, loading, error}` state over the [`SwrCache`].
//!
//! Every mount, key change, refetch or focus revalidation starts a new *generation*. A response
//! is applied only if its generation is still the current one and the resource has not been
//! torn down; anything else is dropped on the floor. Requests themselves are never aborted.
//!
//! Values the cache accepts for the same key through another resource (a sibling's refetch or
//! stale revalidation) are taken as well, as long as this resource is idle.
//!
//! ```ignore
//! let cache = SwrCache::new(Fetcher::new(&settings.api), SwrPolicy::from(&settings.swr));
//! let debt = Resource::<DebtHistory>::mount(&cache, endpoints::debt_history(Some(365)));
//! let state = debt.settled().await;
//! ```

mod section;
mod state;

pub use section::{RefetchHandle, SectionView};
pub use state::{Phase, ResourceState};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::fetcher::RequestKey;
use crate::swr::{CacheUpdate, FetchResult, SwrCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Mount,
    KeyChange,
    Refetch,
    Focus,
}

struct ResourceInner<T> {
    cache: SwrCache,
    key: Mutex<RequestKey>,
    generation: AtomicU64,
    torn_down: AtomicBool,
    cancel: CancellationToken,
    state: watch::Sender<ResourceState<T>>,
    /// Raw payload behind `state.data`; written under the state lock.
    shown: Mutex<Option<Arc<Value>>>,
}

/// Owner of one resource. Dropping it tears the resource down.
pub struct Resource<T> {
    inner: Arc<ResourceInner<T>>,
}

impl<T> Resource<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Creates the resource and issues its first request.
    pub fn mount(cache: &SwrCache, key: RequestKey) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        let inner = Arc::new(ResourceInner {
            cache: cache.clone(),
            key: Mutex::new(key),
            generation: AtomicU64::new(0),
            torn_down: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            state,
            shown: Mutex::new(None),
        });
        let focus = cache
            .policy()
            .revalidate_on_focus
            .then(|| cache.focus_events());
        spawn_cache_listener(Arc::downgrade(&inner), focus, cache.updates());
        inner.begin(Trigger::Mount);
        Self { inner }
    }

    pub fn key(&self) -> RequestKey {
        self.inner.current_key()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ResourceState<T> {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every applied state change.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.inner.state.subscribe()
    }

    /// Starts a new generation and forces a network request, whether or not the previous
    /// request has settled.
    pub fn refetch(&self) {
        self.inner.begin(Trigger::Refetch);
    }

    /// Switches to another key (a dependency changed). Same key is a no-op.
    pub fn set_key(&self, key: RequestKey) {
        {
            let mut current = self.inner.key.lock().unwrap_or_else(|e| e.into_inner());
            if *current == key {
                return;
            }
            *current = key;
        }
        self.inner.begin(Trigger::KeyChange);
    }

    /// Makes every later write to this resource's state a no-op.
    pub fn teardown(&self) {
        self.inner.teardown();
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::SeqCst)
    }

    /// Waits until the current generation settles (or the resource is torn down) and
    /// returns the state at that point.
    pub async fn settled(&self) -> ResourceState<T> {
        let mut rx = self.inner.state.subscribe();
        tokio::select! {
            r = rx.wait_for(|s| !s.loading) => match r {
                Ok(s) => s.clone(),
                Err(_) => self.state(),
            },
            _ = self.inner.cancel.cancelled() => self.state(),
        }
    }

    /// Retry trigger that does not keep the resource alive.
    pub fn refetch_handle(&self) -> RefetchHandle {
        let weak = Arc::downgrade(&self.inner);
        RefetchHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.begin(Trigger::Refetch);
            }
        })
    }

    /// Section view for the current state.
    pub fn view(&self) -> SectionView<T> {
        SectionView::from_state(&self.inner.state.borrow(), self.refetch_handle())
    }
}

impl<T> Drop for Resource<T> {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl<T> ResourceInner<T> {
    fn current_key(&self) -> RequestKey {
        self.key.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn show(&self, raw: Option<Arc<Value>>) {
        *self.shown.lock().unwrap_or_else(|e| e.into_inner()) = raw;
    }

    fn is_shown(&self, raw: &Arc<Value>) -> bool {
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|r| Arc::ptr_eq(r, raw))
    }

    fn teardown(&self) {
        // Under the state lock, so no apply can be half-way through a write.
        self.state.send_if_modified(|_| {
            self.torn_down.store(true, Ordering::SeqCst);
            false
        });
        self.cancel.cancel();
    }
}

impl<T> ResourceInner<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn begin(self: &Arc<Self>, trigger: Trigger) {
        let key = self.current_key();
        let policy = self.cache.policy().clone();
        let force = trigger == Trigger::Refetch;

        let fresh = if force { None } else { self.cache.fresh(&key) };
        let cached = match &fresh {
            Some(v) => Some(v.data.clone()),
            None => self.cache.peek(&key).map(|v| v.data),
        }
        .and_then(|raw| decode::<T>(&raw).ok().map(|data| (raw, data)));
        // Fresh value: nothing to ask the network. Stale value without revalidate-if-stale: serve it.
        let settled_from_cache = cached.is_some()
            && (fresh.is_some()
                || (!policy.revalidate_if_stale
                    && matches!(trigger, Trigger::Mount | Trigger::KeyChange)));

        let mut started = None;
        self.state.send_if_modified(|s| {
            if self.torn_down.load(Ordering::SeqCst) {
                return false;
            }
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            started = Some(generation);
            s.generation = generation;
            match trigger {
                Trigger::Mount | Trigger::KeyChange => {
                    if let Some((raw, data)) = &cached {
                        s.data = Some(data.clone());
                        self.show(Some(raw.clone()));
                    } else if trigger == Trigger::KeyChange && !policy.keep_previous_data {
                        s.data = None;
                        self.show(None);
                    }
                }
                Trigger::Refetch | Trigger::Focus => {}
            }
            s.loading = !settled_from_cache;
            if settled_from_cache {
                s.error = None;
            }
            true
        });
        let Some(generation) = started else {
            return;
        };
        if settled_from_cache {
            tracing::debug!(%key, generation, "served from cache");
            return;
        }

        tracing::debug!(%key, generation, ?trigger, "requesting");
        let request = self.cache.request(&key, force);
        let inner = self.clone();
        tokio::spawn(async move {
            let outcome = request.await;
            inner.apply(generation, outcome);
        });
    }

    fn apply(&self, generation: u64, outcome: FetchResult) {
        let decoded = outcome.and_then(|raw| decode::<T>(&raw).map(|data| (raw, data)));
        let applied = self.state.send_if_modified(|s| {
            if self.torn_down.load(Ordering::SeqCst) || s.generation != generation {
                return false;
            }
            s.loading = false;
            match &decoded {
                Ok((raw, data)) => {
                    s.data = Some(data.clone());
                    s.error = None;
                    self.show(Some(raw.clone()));
                }
                Err(e) => s.error = Some(e.clone()),
            }
            true
        });
        if !applied {
            tracing::debug!(generation, "discarding superseded or torn-down response");
        }
    }

    /// Takes a value another request stored for this key. Ignored while this resource has its
    /// own request pending, after teardown, or when the value is already shown.
    fn accept(&self, update: CacheUpdate) {
        if update.key != self.current_key() {
            return;
        }
        let accepted = self.state.send_if_modified(|s| {
            if self.torn_down.load(Ordering::SeqCst) || s.loading || self.is_shown(&update.data) {
                return false;
            }
            match decode::<T>(&update.data) {
                Ok(data) => {
                    s.data = Some(data);
                    s.error = None;
                    self.show(Some(update.data.clone()));
                    true
                }
                Err(_) => false,
            }
        });
        if accepted {
            tracing::debug!(key = %update.key, "took value from a sibling request");
        }
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<Arc<T>, FetchError> {
    T::deserialize(value).map(Arc::new).map_err(FetchError::from)
}

/// Revalidates on focus (when `focus` is given) and forwards cache updates until teardown.
fn spawn_cache_listener<T>(
    inner: Weak<ResourceInner<T>>,
    mut focus: Option<broadcast::Receiver<()>>,
    mut updates: broadcast::Receiver<CacheUpdate>,
) where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let Some(cancel) = inner.upgrade().map(|i| i.cancel.clone()) else {
        return;
    };
    tokio::spawn(async move {
        loop {
            let focus_event = async {
                match focus.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = focus_event => match event {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        let Some(inner) = inner.upgrade() else { break };
                        inner.begin(Trigger::Focus);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                update = updates.recv() => match update {
                    Ok(update) => {
                        let Some(inner) = inner.upgrade() else { break };
                        inner.accept(update);
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    });
}
