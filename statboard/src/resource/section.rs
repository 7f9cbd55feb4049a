//! What a data-bearing section shows for a given resource state.

use std::fmt;
use std::sync::Arc;

use super::state::ResourceState;

/// Cloneable retry trigger handed to error views. Does nothing once the resource is gone.
#[derive(Clone)]
pub struct RefetchHandle {
    trigger: Arc<dyn Fn() + Send + Sync>,
}

impl RefetchHandle {
    pub(crate) fn new(trigger: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            trigger: Arc::new(trigger),
        }
    }

    pub fn refetch(&self) {
        (self.trigger)();
    }
}

impl fmt::Debug for RefetchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefetchHandle")
    }
}

/// One of skeleton, populated view, or compact error with retry.
///
/// Each section derives its own view, so one failing section never blocks another.
#[derive(Debug)]
pub enum SectionView<T> {
    Skeleton,
    /// `refreshing` is set while a background revalidation is running.
    Populated { data: Arc<T>, refreshing: bool },
    Error { message: String, retry: RefetchHandle },
}

impl<T> SectionView<T> {
    /// A settled failure wins over stale data; otherwise any data is shown, else a skeleton.
    pub fn from_state(state: &ResourceState<T>, retry: RefetchHandle) -> Self {
        match (&state.error, &state.data) {
            (Some(e), _) if !state.loading => SectionView::Error {
                message: e.to_string(),
                retry,
            },
            (_, Some(data)) => SectionView::Populated {
                data: data.clone(),
                refreshing: state.loading,
            },
            _ => SectionView::Skeleton,
        }
    }
}
