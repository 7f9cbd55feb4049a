//! Plain-text toolkit: renders a bound chart as terminal lines.

use std::fmt::Write;

use async_trait::async_trait;

use super::frame::ChartPlan;
use super::ChartToolkit;
use crate::error::ModuleLoadError;
use crate::module_cache::{ModuleIdentity, ModuleLoader};

/// Identity under which the text toolkit is registered.
pub const TEXT_TOOLKIT: &str = "text-charts";

#[derive(Debug, Clone, Default)]
pub struct TextToolkit;

impl ChartToolkit for TextToolkit {
    type Output = String;

    fn render(&self, plan: &ChartPlan) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:?} chart ({}px)", plan.kind, plan.height);
        for axis in &plan.axes {
            let name = axis.label.as_deref().unwrap_or("");
            let _ = writeln!(out, "  axis {:?} {}: {}", axis.id, name, axis.ticks.join(" | "));
        }
        for series in &plan.series {
            let _ = writeln!(out, "  {} [{:?}]", series.label, series.axis);
            for p in &series.points {
                let _ = writeln!(out, "    {:<12} {}", p.x, p.label.as_deref().unwrap_or("-"));
            }
        }
        out
    }
}

/// Loader for [`TextToolkit`]; only [`TEXT_TOOLKIT`] is known.
pub struct TextToolkitLoader;

#[async_trait]
impl ModuleLoader<TextToolkit> for TextToolkitLoader {
    async fn import(&self, identity: &ModuleIdentity) -> Result<TextToolkit, ModuleLoadError> {
        if identity.as_str() == TEXT_TOOLKIT {
            Ok(TextToolkit)
        } else {
            Err(ModuleLoadError::new(identity.as_str(), "unknown chart toolkit"))
        }
    }
}
