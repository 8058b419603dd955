//! MECE decomposition frameworks: catalog and deterministic selection.
//!
//! The framework catalog is a static table; picking one is a pure rule
//! engine over the [`Analysis`] classification tags, never an LLM call.
//! Selection is deterministic: the same analysis always yields the same
//! framework.

use serde::{Deserialize, Serialize};

use super::analysis::Analysis;

/// The closed catalog of decomposition schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkKind {
    /// Customer / Competitor / Company: market-entry and go-to-market.
    ThreeC,
    /// Strengths / Weaknesses / Opportunities / Threats.
    Swot,
    /// BCG growth-share matrix quadrants.
    Bcg,
    /// Generic current-state / challenges / direction split.
    Custom,
}

impl std::fmt::Display for FrameworkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FrameworkKind::ThreeC => "3C",
            FrameworkKind::Swot => "SWOT",
            FrameworkKind::Bcg => "BCG",
            FrameworkKind::Custom => "CUSTOM",
        };
        f.write_str(name)
    }
}

/// A MECE decomposition scheme with its ordered category list.
///
/// The categories are mutually exclusive and collectively exhaustive with
/// respect to the analysis domain; the downstream [`Pyramid`] must carry
/// exactly one supporting argument per category (set equality is enforced,
/// violation is fatal).
///
/// [`Pyramid`]: super::pyramid::Pyramid
///
/// # Examples
///
/// ```
/// use deckweaver::artifacts::{Framework, FrameworkKind};
///
/// let fw = Framework::from_catalog(FrameworkKind::ThreeC);
/// assert_eq!(fw.categories.len(), 3);
/// assert_eq!(fw.name, "3C");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framework {
    pub kind: FrameworkKind,
    pub name: String,
    pub description: String,
    /// Ordered category list; one content segment and one pyramid
    /// argument per entry.
    pub categories: Vec<String>,
}

impl Framework {
    /// Look up the static catalog entry for `kind`.
    pub fn from_catalog(kind: FrameworkKind) -> Self {
        let (description, categories): (&str, &[&str]) = match kind {
            FrameworkKind::ThreeC => (
                "Market analysis across customers, competitors, and own capabilities",
                &["Customer", "Competitor", "Company"],
            ),
            FrameworkKind::Swot => (
                "Internal strengths and weaknesses against external opportunities and threats",
                &["Strengths", "Weaknesses", "Opportunities", "Threats"],
            ),
            FrameworkKind::Bcg => (
                "Portfolio positioning by market growth and relative share",
                &["Stars", "Cash Cows", "Question Marks", "Dogs"],
            ),
            FrameworkKind::Custom => (
                "Situation-driven decomposition from current state to strategic direction",
                &["Current State", "Key Challenges", "Strategic Direction"],
            ),
        };
        Self {
            kind,
            name: kind.to_string(),
            description: description.to_string(),
            categories: categories.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Deterministic rule engine over the analysis tags.
    ///
    /// Rules are checked in order; the first match wins:
    /// market entry / go-to-market / launch → 3C, SWOT mention → SWOT,
    /// matrix / BCG mention → BCG, otherwise CUSTOM.
    pub fn select(analysis: &Analysis) -> Self {
        let kind = if analysis.mentions(&["market entry", "go-to-market", "launch", "entry"]) {
            FrameworkKind::ThreeC
        } else if analysis.mentions(&["swot"]) {
            FrameworkKind::Swot
        } else if analysis.mentions(&["matrix", "bcg"]) {
            FrameworkKind::Bcg
        } else {
            FrameworkKind::Custom
        };
        Self::from_catalog(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis_with_context(context: &str) -> Analysis {
        Analysis {
            context: context.into(),
            ..Analysis::new("key message")
        }
    }

    #[test]
    fn selection_rules_match_in_order() {
        let cases = [
            ("APAC market entry plan", FrameworkKind::ThreeC),
            ("annual SWOT assessment", FrameworkKind::Swot),
            ("portfolio matrix review", FrameworkKind::Bcg),
            ("quarterly business update", FrameworkKind::Custom),
        ];
        for (context, expected) in cases {
            let fw = Framework::select(&analysis_with_context(context));
            assert_eq!(fw.kind, expected, "context: {context}");
        }
    }

    #[test]
    fn market_entry_wins_over_swot_mention() {
        // First rule that matches wins, even if later needles also appear.
        let fw = Framework::select(&analysis_with_context("market entry with SWOT appendix"));
        assert_eq!(fw.kind, FrameworkKind::ThreeC);
    }

    #[test]
    fn selection_is_deterministic() {
        let analysis = analysis_with_context("product launch strategy");
        let a = Framework::select(&analysis);
        let b = Framework::select(&analysis);
        assert_eq!(a, b);
    }
}
