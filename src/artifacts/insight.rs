//! Four-level analytical insights.

use serde::{Deserialize, Serialize};

/// Classification of an insight, used to pick a chart type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// Growth-rate comparison against a prior period.
    Comparison,
    /// Time-series movement over periods.
    Trend,
    /// Share of a whole (percent values up to 100).
    Composition,
    /// Plain observation without comparison context.
    Observation,
}

/// The four-level analytical progression for one data point:
/// observation → comparison → implication → action.
///
/// Produced deterministically by the insight ladder; every validated data
/// point yields exactly one insight with four non-empty levels and a
/// confidence in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Id of the source data point.
    pub data_id: String,
    pub kind: InsightKind,
    /// Level 1: what the number says.
    pub observation: String,
    /// Level 2: how it compares.
    pub comparison: String,
    /// Level 3: why it moved.
    pub implication: String,
    /// Level 4: what to do about it.
    pub action: String,
    /// Confidence in `[0, 1]`; lower when comparison data was missing.
    pub confidence: f64,
}

impl Insight {
    /// All four levels present and confidence in range.
    pub fn is_complete(&self) -> bool {
        !self.observation.trim().is_empty()
            && !self.comparison.trim().is_empty()
            && !self.implication.trim().is_empty()
            && !self.action.trim().is_empty()
            && (0.0..=1.0).contains(&self.confidence)
    }
}
