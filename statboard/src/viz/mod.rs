//! Lazy visualization: a chart that shows a same-height placeholder until its toolkit
//! module resolves through the [`ModuleCache`], then renders bound to the dataset.

mod dataset;
mod frame;
mod spec;
mod text;

pub use dataset::{Dataset, Row};
pub use frame::{BoundAxis, BoundSeries, ChartFrame, ChartPlan, Placeholder, Point, TICK_COUNT};
pub use spec::{
    AxisFormatter, AxisId, AxisSpec, ChartKind, ChartSpec, ChartSpecBuilder, ChartSpecError,
    SeriesSpec, DEFAULT_CHART_HEIGHT,
};
pub use text::{TextToolkit, TextToolkitLoader, TEXT_TOOLKIT};

use crate::module_cache::{ModuleCache, ModuleIdentity};

/// A charting toolkit: the heavy module a [`LazyChart`] defers.
pub trait ChartToolkit: Send + Sync + 'static {
    type Output;

    fn render(&self, plan: &ChartPlan) -> Self::Output;
}

/// Chart whose toolkit is loaded on demand.
pub struct LazyChart<K> {
    modules: ModuleCache<K>,
    identity: ModuleIdentity,
    spec: ChartSpec,
}

impl<K: ChartToolkit> LazyChart<K> {
    pub fn new(modules: ModuleCache<K>, identity: impl Into<ModuleIdentity>, spec: ChartSpec) -> Self {
        Self {
            modules,
            identity: identity.into(),
            spec,
        }
    }

    pub fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    pub fn placeholder(&self) -> Placeholder {
        Placeholder::for_height(self.spec.height())
    }

    /// Starts loading the toolkit without waiting. Needs a tokio runtime.
    pub fn prefetch(&self) {
        self.modules.prefetch(&self.identity);
    }

    /// What to show right now, without waiting: the chart if the toolkit is resolved, else the
    /// placeholder. An empty dataset is `NoData` either way.
    pub fn frame(&self, data: &Dataset) -> ChartFrame<K::Output> {
        if data.is_empty() {
            return self.no_data();
        }
        match self.modules.get(&self.identity) {
            Some(toolkit) => self.draw(&toolkit, data),
            None => ChartFrame::Placeholder(self.placeholder()),
        }
    }

    /// Waits for the toolkit, then renders. A failed load becomes a `Failed` frame.
    pub async fn render(&self, data: &Dataset) -> ChartFrame<K::Output> {
        if data.is_empty() {
            return self.no_data();
        }
        match self.modules.load(&self.identity).await {
            Ok(toolkit) => self.draw(&toolkit, data),
            Err(e) => ChartFrame::Failed {
                height: self.spec.height(),
                message: e.to_string(),
            },
        }
    }

    fn no_data(&self) -> ChartFrame<K::Output> {
        ChartFrame::NoData {
            height: self.spec.height(),
        }
    }

    fn draw(&self, toolkit: &K, data: &Dataset) -> ChartFrame<K::Output> {
        let plan = ChartPlan::bind(&self.spec, data);
        ChartFrame::Chart {
            height: self.spec.height(),
            output: toolkit.render(&plan),
        }
    }
}
