//! # statboard
//!
//! Data layer of a statistics dashboard: every section fetches a JSON resource, keeps it in a
//! stale-while-revalidate cache, and renders charts whose toolkit is loaded lazily.
//!
//! ## Pieces
//!
//! - [`fetcher`]: [`Fetcher`] performs one GET per call against the API base; failures are
//!   typed as [`FetchError`]. The transport sits behind [`HttpClient`].
//! - [`swr`]: [`SwrPolicy`] (dedupe window, fixed-interval retry, focus and stale
//!   revalidation) applied by the shared [`SwrCache`].
//! - [`resource`]: [`Resource`], the per-section `{data, loading, error, refetch}` state machine.
//!   Generation tags keep slow or torn-down responses from writing state.
//! - [`module_cache`]: [`ModuleCache`] imports each lazy module at most once.
//! - [`viz`]: [`LazyChart`] shows a same-height placeholder until its toolkit is loaded.
//! - [`export`]: [`RawDataExporter`] downloads raw JSON, never cached.
//! - [`endpoints`]: request keys and response types for common resources.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use statboard::{endpoints, Fetcher, Resource, SwrCache, SwrPolicy};
//!
//! # async fn run() {
//! let settings = env_config::Settings::load(env_config::APP_NAME).unwrap_or_default();
//! let cache = SwrCache::new(Fetcher::new(&settings.api), SwrPolicy::from(&settings.swr));
//!
//! let debt = Resource::<endpoints::DebtHistory>::mount(&cache, endpoints::debt_history(Some(365)));
//! let state = debt.settled().await;
//! if let Some(history) = state.data {
//!     println!("{} points", history.data.len());
//! }
//! # }
//! ```

pub mod endpoints;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod module_cache;
pub mod resource;
pub mod swr;
pub mod viz;

pub use error::{FetchError, ModuleLoadError};
pub use export::{DataEndpoint, ExportError, RawDataExporter};
pub use fetcher::{Fetcher, HttpClient, HttpResponse, RequestKey, ReqwestHttpClient};
pub use module_cache::{ModuleCache, ModuleIdentity, ModuleLoader};
pub use resource::{Phase, RefetchHandle, Resource, ResourceState, SectionView};
pub use swr::{CacheUpdate, CachedValue, RetryPolicy, SwrCache, SwrPolicy};
pub use viz::{
    AxisId, AxisSpec, ChartFrame, ChartKind, ChartSpec, ChartToolkit, Dataset, LazyChart,
    Placeholder, SeriesSpec,
};
