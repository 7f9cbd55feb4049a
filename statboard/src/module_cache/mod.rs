//! Module cache: deferred heavy modules (chart toolkits), imported at most once per identity.
//!
//! The first `load` for an identity registers a pending entry before the import runs, so
//! concurrent callers all wait on the same import. A resolved module is handed out
//! synchronously afterwards. A failed import removes its entry so a later `load` retries.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;

use crate::error::ModuleLoadError;

/// Name of a lazily imported module, e.g. `"charts"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdentity(String);

impl ModuleIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleIdentity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Performs the actual (expensive) import.
#[async_trait]
pub trait ModuleLoader<M>: Send + Sync {
    async fn import(&self, identity: &ModuleIdentity) -> Result<M, ModuleLoadError>;
}

type SharedLoad<M> = Shared<BoxFuture<'static, Result<Arc<M>, ModuleLoadError>>>;

enum ModuleEntry<M> {
    Pending { ticket: u64, load: SharedLoad<M> },
    Resolved(Arc<M>),
}

struct Inner<M> {
    loader: Arc<dyn ModuleLoader<M>>,
    entries: DashMap<ModuleIdentity, ModuleEntry<M>>,
    next_ticket: AtomicU64,
    imports: AtomicUsize,
}

/// Injectable, resettable cache of lazily imported modules. Clones share state.
pub struct ModuleCache<M> {
    inner: Arc<Inner<M>>,
}

impl<M> Clone for ModuleCache<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M> ModuleCache<M>
where
    M: Send + Sync + 'static,
{
    pub fn new(loader: Arc<dyn ModuleLoader<M>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                loader,
                entries: DashMap::new(),
                next_ticket: AtomicU64::new(0),
                imports: AtomicUsize::new(0),
            }),
        }
    }

    /// Resolved module, without waiting. `None` while pending, failed or never requested.
    pub fn get(&self, identity: &ModuleIdentity) -> Option<Arc<M>> {
        match self.inner.entries.get(identity).as_deref() {
            Some(ModuleEntry::Resolved(m)) => Some(m.clone()),
            _ => None,
        }
    }

    /// Whether an import for `identity` has started and not settled yet.
    pub fn is_pending(&self, identity: &ModuleIdentity) -> bool {
        matches!(
            self.inner.entries.get(identity).as_deref(),
            Some(ModuleEntry::Pending { .. })
        )
    }

    /// Loads `identity`, starting the import if nobody has yet.
    pub async fn load(&self, identity: &ModuleIdentity) -> Result<Arc<M>, ModuleLoadError> {
        match self.start(identity) {
            Ok(module) => Ok(module),
            Err(pending) => pending.await,
        }
    }

    /// Starts the import in the background if needed; does not wait.
    pub fn prefetch(&self, identity: &ModuleIdentity) {
        let _ = self.start(identity);
    }

    /// Imports started so far, failed ones included.
    pub fn import_count(&self) -> usize {
        self.inner.imports.load(Ordering::SeqCst)
    }

    /// Forgets every module. Imports in flight finish but are not stored.
    pub fn reset(&self) {
        self.inner.entries.clear();
    }

    /// `Ok` with the module when resolved, `Err` with the shared import otherwise.
    fn start(&self, identity: &ModuleIdentity) -> Result<Arc<M>, SharedLoad<M>> {
        match self.inner.entries.entry(identity.clone()) {
            Entry::Occupied(occupied) => match occupied.get() {
                ModuleEntry::Resolved(m) => Ok(m.clone()),
                ModuleEntry::Pending { load, .. } => Err(load.clone()),
            },
            Entry::Vacant(vacant) => {
                let ticket = self.inner.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
                let (tx, rx) = oneshot::channel();
                let id = identity.clone();
                let load = rx
                    .map(move |r| {
                        r.unwrap_or_else(|_| {
                            Err(ModuleLoadError::new(id.as_str(), "import task dropped"))
                        })
                    })
                    .boxed()
                    .shared();
                vacant.insert(ModuleEntry::Pending {
                    ticket,
                    load: load.clone(),
                });
                self.spawn_import(identity.clone(), ticket, tx);
                Err(load)
            }
        }
    }

    fn spawn_import(
        &self,
        identity: ModuleIdentity,
        ticket: u64,
        tx: oneshot::Sender<Result<Arc<M>, ModuleLoadError>>,
    ) {
        self.inner.imports.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(module = %identity, "importing module");
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let outcome = inner.loader.import(&identity).await.map(Arc::new);
            // Only the entry this import registered may be touched; a reset may have replaced it.
            if let Entry::Occupied(mut occupied) = inner.entries.entry(identity.clone()) {
                let ours = matches!(occupied.get(), ModuleEntry::Pending { ticket: t, .. } if *t == ticket);
                if ours {
                    match &outcome {
                        Ok(m) => {
                            occupied.insert(ModuleEntry::Resolved(m.clone()));
                        }
                        Err(e) => {
                            tracing::warn!(module = %identity, error = %e, "module import failed; entry cleared for retry");
                            occupied.remove();
                        }
                    }
                }
            }
            let _ = tx.send(outcome);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct SlowLoader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModuleLoader<String> for SlowLoader {
        async fn import(&self, identity: &ModuleIdentity) -> Result<String, ModuleLoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(format!("module:{}", identity))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn get_is_none_until_resolved_then_synchronous() {
        let loader = Arc::new(SlowLoader {
            calls: AtomicUsize::new(0),
        });
        let cache = ModuleCache::new(loader.clone());
        let id = ModuleIdentity::new("charts");

        assert!(cache.get(&id).is_none());
        cache.prefetch(&id);
        assert!(cache.is_pending(&id));
        assert!(cache.get(&id).is_none());

        let loaded = cache.load(&id).await.unwrap();
        let again = cache.get(&id).unwrap();
        assert!(Arc::ptr_eq(&loaded, &again));
        assert_eq!(*again, "module:charts");
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_discards_in_flight_import() {
        let loader = Arc::new(SlowLoader {
            calls: AtomicUsize::new(0),
        });
        let cache = ModuleCache::new(loader.clone());
        let id = ModuleIdentity::new("charts");

        cache.prefetch(&id);
        cache.reset();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.get(&id).is_none());

        cache.load(&id).await.unwrap();
        assert_eq!(cache.import_count(), 2);
    }
}
