//! Quality scoring of finalized decks.
//!
//! The reviewer scores five criteria, each normalized to `[0, 1]`, and
//! combines them with fixed weights:
//!
//! | Criterion     | Weight |
//! |---------------|--------|
//! | clarity       | 0.20   |
//! | insight       | 0.25   |
//! | structure     | 0.20   |
//! | visual        | 0.15   |
//! | actionability | 0.20   |
//!
//! Sub-scores below [`HINT_THRESHOLD`] yield [`ImprovementHint`]s that
//! drive the orchestrator's partial re-run strategy.

pub mod evaluator;
pub mod so_what;
pub mod visual;

pub use evaluator::QualityEvaluator;
pub use so_what::{SoWhatResult, SoWhatTester};
pub use visual::{validate_slide, VisualIssue};

use serde::{Deserialize, Serialize};

/// Sub-scores below this yield an improvement hint.
pub const HINT_THRESHOLD: f64 = 0.7;
/// Sub-scores below this make the hint high-priority.
pub const HIGH_PRIORITY_THRESHOLD: f64 = 0.5;

/// The five scored criteria.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Clarity,
    Insight,
    Structure,
    Visual,
    Actionability,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Clarity,
        Criterion::Insight,
        Criterion::Structure,
        Criterion::Visual,
        Criterion::Actionability,
    ];

    /// Fixed rubric weight.
    pub fn weight(self) -> f64 {
        match self {
            Criterion::Clarity => 0.20,
            Criterion::Insight => 0.25,
            Criterion::Structure => 0.20,
            Criterion::Visual => 0.15,
            Criterion::Actionability => 0.20,
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Criterion::Clarity => "clarity",
            Criterion::Insight => "insight",
            Criterion::Structure => "structure",
            Criterion::Visual => "visual",
            Criterion::Actionability => "actionability",
        };
        f.pad(tag)
    }
}

/// Hint priority, derived from the sub-score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
}

/// One targeted improvement suggestion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementHint {
    pub criterion: Criterion,
    pub priority: Priority,
    pub suggestion: String,
}

/// The reviewer's verdict on one deck.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub clarity: f64,
    pub insight: f64,
    pub structure: f64,
    pub visual: f64,
    pub actionability: f64,
    /// Weighted total over the five criteria.
    pub total: f64,
    pub passed: bool,
    #[serde(default)]
    pub hints: Vec<ImprovementHint>,
}

impl QualityScore {
    pub fn sub_score(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Clarity => self.clarity,
            Criterion::Insight => self.insight,
            Criterion::Structure => self.structure,
            Criterion::Visual => self.visual,
            Criterion::Actionability => self.actionability,
        }
    }

    /// Hints filtered to high priority, as the re-run selector consumes
    /// them.
    pub fn high_priority_hints(&self) -> impl Iterator<Item = &ImprovementHint> {
        self.hints
            .iter()
            .filter(|h| h.priority == Priority::High)
    }

    /// Plain-text report for logs and operators.
    pub fn report(&self) -> String {
        let mut lines = vec![format!(
            "Quality {:.3} — {}",
            self.total,
            if self.passed { "PASSED" } else { "BELOW TARGET" }
        )];
        for criterion in Criterion::ALL {
            lines.push(format!(
                "  {criterion:<13} {:.3} (weight {:.2})",
                self.sub_score(criterion),
                criterion.weight()
            ));
        }
        for hint in &self.hints {
            lines.push(format!(
                "  [{:?}] {}: {}",
                hint.priority, hint.criterion, hint.suggestion
            ));
        }
        lines.join("\n")
    }
}
