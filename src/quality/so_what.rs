//! The So-What test: does a headline carry an actionable implication?

use serde::{Deserialize, Serialize};

/// Minimum headline length (in characters) for a full-credit headline.
const MIN_LENGTH: usize = 20;

const ACTION_VERBS: &[&str] = &[
    // en
    "expand", "invest", "launch", "improve", "accelerate", "capture", "secure", "reduce",
    "deliver", "grow", "achieve", "drive", "build",
    // ko
    "제공", "확보", "달성", "실현", "개선", "확대", "강화", "투자", "추진", "필요",
    "증가", "감소",
];

const IMPLICATION_KEYWORDS: &[&str] = &[
    // en
    "opportunity", "risk", "must", "should", "critical", "key", "required", "needed",
    "potential", "threat",
    // ko
    "가능", "필요", "실현", "확보", "기회", "위협", "중요", "핵심",
];

/// Outcome of one So-What test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoWhatResult {
    /// Partial credit in `[0, 1]`: verb 0.3, number 0.3, length 0.2,
    /// implication keyword 0.2.
    pub score: f64,
    /// Full pass: all four components present.
    pub passed: bool,
}

/// Heuristic tester shared by the evaluator (scoring headlines) and the
/// designer (deciding whether a headline needs polishing).
#[derive(Clone, Copy, Debug, Default)]
pub struct SoWhatTester;

impl SoWhatTester {
    pub fn new() -> Self {
        Self
    }

    pub fn test(&self, headline: &str) -> SoWhatResult {
        let lower = headline.to_lowercase();
        let has_verb = ACTION_VERBS.iter().any(|v| lower.contains(v));
        let has_number = headline.chars().any(|c| c.is_ascii_digit());
        let long_enough = headline.chars().count() >= MIN_LENGTH;
        let has_implication = IMPLICATION_KEYWORDS.iter().any(|k| lower.contains(k));

        let mut score: f64 = 0.0;
        if has_verb {
            score += 0.3;
        }
        if has_number {
            score += 0.3;
        }
        if long_enough {
            score += 0.2;
        }
        if has_implication {
            score += 0.2;
        }

        SoWhatResult {
            score: score.min(1.0),
            passed: has_verb && has_number && long_enough && has_implication,
        }
    }
}
