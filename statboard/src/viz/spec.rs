//! Chart descriptors: kind, fixed height, series and the axes they are plotted against.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Height used when a chart does not set one.
pub const DEFAULT_CHART_HEIGHT: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

/// Value axis. Two axes give a dual-scale chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisId {
    Left,
    Right,
}

pub type AxisFormatter = Arc<dyn Fn(f64) -> String + Send + Sync>;

/// A value axis with its tick formatter, supplied by the section that owns the chart.
#[derive(Clone)]
pub struct AxisSpec {
    pub id: AxisId,
    pub label: Option<String>,
    formatter: AxisFormatter,
}

impl AxisSpec {
    /// Axis with plain `{}` number formatting.
    pub fn new(id: AxisId) -> Self {
        Self {
            id,
            label: None,
            formatter: Arc::new(|v| format!("{}", v)),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn formatter(mut self, f: impl Fn(f64) -> String + Send + Sync + 'static) -> Self {
        self.formatter = Arc::new(f);
        self
    }

    pub fn format(&self, value: f64) -> String {
        (self.formatter)(value)
    }
}

impl fmt::Debug for AxisSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AxisSpec")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// One plotted series: which field of each row it reads and which axis scales it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSpec {
    pub data_key: String,
    pub label: String,
    pub axis: AxisId,
    pub color: Option<String>,
}

impl SeriesSpec {
    /// Series on the left axis.
    pub fn new(data_key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            data_key: data_key.into(),
            label: label.into(),
            axis: AxisId::Left,
            color: None,
        }
    }

    pub fn on_axis(mut self, axis: AxisId) -> Self {
        self.axis = axis;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartSpecError {
    #[error("chart has no series")]
    NoSeries,
    #[error("chart height must be positive")]
    ZeroHeight,
    #[error("axis {0:?} declared twice")]
    DuplicateAxis(AxisId),
    #[error("series `{series}` uses undeclared axis {axis:?}")]
    UndeclaredAxis { series: String, axis: AxisId },
}

/// Validated chart description.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    kind: ChartKind,
    height: u32,
    x_key: String,
    series: Vec<SeriesSpec>,
    axes: Vec<AxisSpec>,
}

impl ChartSpec {
    /// Starts a chart whose category (x) values come from `x_key`.
    pub fn builder(kind: ChartKind, x_key: impl Into<String>) -> ChartSpecBuilder {
        ChartSpecBuilder {
            kind,
            height: DEFAULT_CHART_HEIGHT,
            x_key: x_key.into(),
            series: Vec::new(),
            axes: Vec::new(),
        }
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn x_key(&self) -> &str {
        &self.x_key
    }

    pub fn series(&self) -> &[SeriesSpec] {
        &self.series
    }

    pub fn axes(&self) -> &[AxisSpec] {
        &self.axes
    }

    pub fn axis(&self, id: AxisId) -> Option<&AxisSpec> {
        self.axes.iter().find(|a| a.id == id)
    }

    pub fn is_dual_axis(&self) -> bool {
        self.axes.len() > 1
    }
}

pub struct ChartSpecBuilder {
    kind: ChartKind,
    height: u32,
    x_key: String,
    series: Vec<SeriesSpec>,
    axes: Vec<AxisSpec>,
}

impl ChartSpecBuilder {
    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn series(mut self, series: SeriesSpec) -> Self {
        self.series.push(series);
        self
    }

    pub fn axis(mut self, axis: AxisSpec) -> Self {
        self.axes.push(axis);
        self
    }

    /// Validates the chart. With no axis declared, a default left axis is added.
    pub fn build(mut self) -> Result<ChartSpec, ChartSpecError> {
        if self.height == 0 {
            return Err(ChartSpecError::ZeroHeight);
        }
        if self.series.is_empty() {
            return Err(ChartSpecError::NoSeries);
        }
        if self.axes.is_empty() {
            self.axes.push(AxisSpec::new(AxisId::Left));
        }
        for (i, axis) in self.axes.iter().enumerate() {
            if self.axes[..i].iter().any(|a| a.id == axis.id) {
                return Err(ChartSpecError::DuplicateAxis(axis.id));
            }
        }
        if let Some(s) = self
            .series
            .iter()
            .find(|s| !self.axes.iter().any(|a| a.id == s.axis))
        {
            return Err(ChartSpecError::UndeclaredAxis {
                series: s.label.clone(),
                axis: s.axis,
            });
        }
        Ok(ChartSpec {
            kind: self.kind,
            height: self.height,
            x_key: self.x_key,
            series: self.series,
            axes: self.axes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_axis_and_height() {
        let spec = ChartSpec::builder(ChartKind::Line, "date")
            .series(SeriesSpec::new("total_debt", "Total debt"))
            .build()
            .unwrap();
        assert_eq!(spec.height(), DEFAULT_CHART_HEIGHT);
        assert_eq!(spec.axes().len(), 1);
        assert!(!spec.is_dual_axis());
        assert_eq!(spec.axis(AxisId::Left).unwrap().format(2.5), "2.5");
    }

    #[test]
    fn series_on_undeclared_axis_is_rejected() {
        let err = ChartSpec::builder(ChartKind::Bar, "year")
            .series(SeriesSpec::new("rate", "Rate").on_axis(AxisId::Right))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ChartSpecError::UndeclaredAxis {
                series: "Rate".into(),
                axis: AxisId::Right
            }
        );
    }

    #[test]
    fn duplicate_axis_and_empty_chart_are_rejected() {
        let dup = ChartSpec::builder(ChartKind::Bar, "year")
            .series(SeriesSpec::new("a", "A"))
            .axis(AxisSpec::new(AxisId::Left))
            .axis(AxisSpec::new(AxisId::Left))
            .build();
        assert_eq!(dup.unwrap_err(), ChartSpecError::DuplicateAxis(AxisId::Left));

        let empty = ChartSpec::builder(ChartKind::Pie, "name").build();
        assert_eq!(empty.unwrap_err(), ChartSpecError::NoSeries);

        let flat = ChartSpec::builder(ChartKind::Pie, "name")
            .series(SeriesSpec::new("a", "A"))
            .height(0)
            .build();
        assert_eq!(flat.unwrap_err(), ChartSpecError::ZeroHeight);
    }
}
