//! Quantitative data points extracted by the analyst.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Comparison context attached to a data point.
///
/// All fields are optional; the insight ladder picks the most salient one
/// that is present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Prior-period value of the same metric.
    pub previous: Option<f64>,
    /// Year-over-year growth rate in percent, if the source stated one.
    pub growth_rate: Option<f64>,
    /// Industry benchmark value of the same metric.
    pub benchmark: Option<f64>,
}

impl Comparison {
    /// Growth rate in percent: the stated one, or computed from
    /// `previous` when that is present and positive.
    pub fn effective_growth_rate(&self, value: f64) -> Option<f64> {
        if let Some(rate) = self.growth_rate {
            return Some(rate);
        }
        match self.previous {
            Some(previous) if previous > 0.0 => Some((value - previous) / previous * 100.0),
            _ => None,
        }
    }

    /// Ratio of `value` to the benchmark, when a positive benchmark exists.
    pub fn benchmark_ratio(&self, value: f64) -> Option<f64> {
        match self.benchmark {
            Some(benchmark) if benchmark > 0.0 => Some(value / benchmark),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_none() && self.growth_rate.is_none() && self.benchmark.is_none()
    }
}

/// One validated quantitative claim.
///
/// Ids are sequential per job (`data_001`, `data_002`, …), assigned after
/// validation. Candidates failing [`DataPoint::is_valid`] are dropped
/// before id assignment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(default)]
    pub id: String,
    pub metric: String,
    pub value: f64,
    pub unit: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub comparison: Option<Comparison>,
    /// Named contribution shares in percent, feeding ladder level 3.
    #[serde(default)]
    pub drivers: FxHashMap<String, f64>,
    #[serde(default)]
    pub context: String,
}

impl DataPoint {
    /// Validation rule: metric and unit non-empty, value finite.
    pub fn is_valid(&self) -> bool {
        !self.metric.trim().is_empty() && !self.unit.trim().is_empty() && self.value.is_finite()
    }

    /// Sequential id in the `data_NNN` scheme.
    pub fn sequential_id(index: usize) -> String {
        format!("data_{:03}", index + 1)
    }

    /// Largest named driver, if any.
    pub fn main_driver(&self) -> Option<(&str, f64)> {
        self.drivers
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(name, pct)| (name.as_str(), *pct))
    }
}
