//! What a lazy chart shows: placeholder, no-data notice, failure notice, or the bound chart.

use super::dataset::{self, Dataset};
use super::spec::{AxisId, ChartKind, ChartSpec};

/// Number of labelled ticks per value axis.
pub const TICK_COUNT: usize = 5;

/// Skeleton occupying exactly the chart's footprint so nothing shifts when the chart arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub height: u32,
    /// Height of the shaded plot area inside the skeleton (title and legend rows take the rest).
    pub plot_height: u32,
}

impl Placeholder {
    pub fn for_height(height: u32) -> Self {
        Self {
            height,
            plot_height: height.saturating_sub(100).max(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: String,
    pub y: Option<f64>,
    /// `y` through the series' axis formatter.
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundSeries {
    pub label: String,
    pub data_key: String,
    pub axis: AxisId,
    pub color: Option<String>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundAxis {
    pub id: AxisId,
    pub label: Option<String>,
    pub ticks: Vec<String>,
}

/// A chart spec bound to a dataset; what a toolkit turns into primitives.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPlan {
    pub kind: ChartKind,
    pub height: u32,
    pub series: Vec<BoundSeries>,
    pub axes: Vec<BoundAxis>,
}

impl ChartPlan {
    pub fn bind(spec: &ChartSpec, data: &Dataset) -> Self {
        let series: Vec<BoundSeries> = spec
            .series()
            .iter()
            .map(|s| {
                let axis = spec.axis(s.axis);
                let points = data
                    .rows()
                    .iter()
                    .map(|row| {
                        let y = dataset::number(row, &s.data_key);
                        Point {
                            x: dataset::label(row, spec.x_key()),
                            y,
                            label: y.zip(axis).map(|(v, a)| a.format(v)),
                        }
                    })
                    .collect();
                BoundSeries {
                    label: s.label.clone(),
                    data_key: s.data_key.clone(),
                    axis: s.axis,
                    color: s.color.clone(),
                    points,
                }
            })
            .collect();

        let axes = spec
            .axes()
            .iter()
            .map(|axis| {
                let values = series
                    .iter()
                    .filter(|s| s.axis == axis.id)
                    .flat_map(|s| s.points.iter().filter_map(|p| p.y));
                BoundAxis {
                    id: axis.id,
                    label: axis.label.clone(),
                    ticks: tick_values(values)
                        .into_iter()
                        .map(|v| axis.format(v))
                        .collect(),
                }
            })
            .collect();

        Self {
            kind: spec.kind(),
            height: spec.height(),
            series,
            axes,
        }
    }
}

/// Evenly spaced values from min to max; one value for a flat series, none for no data.
fn tick_values(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return Vec::new();
    }
    if min == max {
        return vec![min];
    }
    let step = (max - min) / (TICK_COUNT - 1) as f64;
    (0..TICK_COUNT).map(|i| min + step * i as f64).collect()
}

/// Render outcome of a [`super::LazyChart`]. Every variant has the chart's height.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartFrame<O> {
    Placeholder(Placeholder),
    NoData { height: u32 },
    Failed { height: u32, message: String },
    Chart { height: u32, output: O },
}

impl<O> ChartFrame<O> {
    pub fn height(&self) -> u32 {
        match self {
            ChartFrame::Placeholder(p) => p.height,
            ChartFrame::NoData { height }
            | ChartFrame::Failed { height, .. }
            | ChartFrame::Chart { height, .. } => *height,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ChartFrame::Placeholder(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::spec::{AxisSpec, SeriesSpec};
    use serde_json::json;

    #[test]
    fn placeholder_plot_area_never_below_200() {
        assert_eq!(Placeholder::for_height(300).plot_height, 200);
        assert_eq!(Placeholder::for_height(450).plot_height, 350);
        assert_eq!(Placeholder::for_height(120).plot_height, 200);
    }

    #[test]
    fn ticks_span_min_to_max() {
        assert_eq!(tick_values([0.0, 8.0].into_iter()), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(tick_values([3.0, 3.0].into_iter()), vec![3.0]);
        assert!(tick_values(std::iter::empty()).is_empty());
    }

    #[test]
    fn bind_formats_each_series_with_its_axis() {
        let spec = ChartSpec::builder(ChartKind::Line, "year")
            .series(SeriesSpec::new("admissions", "Admissions"))
            .series(SeriesSpec::new("ratio", "Ratio").on_axis(AxisId::Right))
            .axis(AxisSpec::new(AxisId::Left).formatter(|v| format!("{:.0}K", v / 1000.0)))
            .axis(AxisSpec::new(AxisId::Right).formatter(|v| format!("{:.1}%", v)))
            .build()
            .unwrap();
        let data = Dataset::from_json(&json!([
            {"year": 2022, "admissions": 1000000, "ratio": 12.5},
            {"year": 2023, "admissions": 2000000}
        ]));

        let plan = ChartPlan::bind(&spec, &data);

        assert_eq!(plan.series[0].points[0].label.as_deref(), Some("1000K"));
        assert_eq!(plan.series[1].points[0].label.as_deref(), Some("12.5%"));
        assert_eq!(plan.series[1].points[1].y, None);
        assert_eq!(plan.axes[0].ticks.first().map(String::as_str), Some("1000K"));
        assert_eq!(plan.axes[0].ticks.last().map(String::as_str), Some("2000K"));
        assert_eq!(plan.axes[1].ticks, vec!["12.5%".to_string()]);
    }
}
