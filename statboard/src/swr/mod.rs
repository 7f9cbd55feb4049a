//! Stale-while-revalidate layer: the [`SwrPolicy`] and the [`SwrCache`] that applies it.

mod cache;
mod policy;

pub use cache::{CacheUpdate, CachedValue, FetchResult, SharedFetch, SwrCache};
pub use policy::{RetryPolicy, SwrPolicy};
