//! Chart specifications derived from insights.

use serde::{Deserialize, Serialize};

/// Supported chart shapes.
///
/// `Waterfall` and `StackedBar` are planned by the analyst but re-mapped
/// to `Bar` when handing specs to a reduced renderer set
/// ([`ChartType::renderable`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Waterfall,
    StackedBar,
}

impl ChartType {
    /// Collapse chart types the baseline renderer cannot draw natively.
    pub fn renderable(self) -> ChartType {
        match self {
            ChartType::Waterfall | ChartType::StackedBar => ChartType::Bar,
            other => other,
        }
    }
}

/// A renderable chart: labels, a numeric series, and provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub title: String,
    /// Categorical labels, 1..=20 entries.
    pub labels: Vec<String>,
    /// Numeric series, same length as `labels`.
    pub values: Vec<f64>,
    /// Id of the insight this chart illustrates.
    pub insight_id: String,
    /// True when the series was synthesized because concrete comparison
    /// data was missing; noted but not reported as an error.
    #[serde(default)]
    pub synthetic: bool,
}

impl ChartSpec {
    /// Maximum number of categorical labels a chart may carry.
    pub const MAX_LABELS: usize = 20;

    /// Labels and values non-empty, matched in length, and bounded.
    pub fn is_well_formed(&self) -> bool {
        !self.labels.is_empty()
            && self.labels.len() == self.values.len()
            && self.labels.len() <= Self::MAX_LABELS
            && self.values.iter().all(|v| v.is_finite())
    }
}
