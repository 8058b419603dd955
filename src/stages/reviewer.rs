//! Reviewer: quality scoring of the styled deck.
//!
//! A thin stage wrapper around [`QualityEvaluator`] so the orchestrator
//! can treat review like every other stage (cancellation at the boundary,
//! a [`StageOutcome`] result). Scoring itself is pure.

use tracing::debug;

use crate::artifacts::{Insight, Pyramid, StyledDeck};
use crate::quality::{QualityEvaluator, QualityScore};

use super::{StageContext, StageOutcome};

pub struct Reviewer {
    evaluator: QualityEvaluator,
}

impl Reviewer {
    pub fn new(target_quality: f64) -> Self {
        Self {
            evaluator: QualityEvaluator::new(target_quality),
        }
    }

    pub fn run(
        &self,
        ctx: &StageContext,
        deck: &StyledDeck,
        insights: &[Insight],
        pyramid: &Pyramid,
    ) -> StageOutcome<QualityScore> {
        if let Err(error) = ctx.guard() {
            return StageOutcome::Fatal(error);
        }
        let score = self.evaluator.evaluate(deck, insights, pyramid);
        debug!(job_id = %ctx.job_id, report = %score.report(), "review complete");
        StageOutcome::Ok(score)
    }
}
