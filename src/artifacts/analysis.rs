//! Strategist output: the structured read of the source document.

use serde::{Deserialize, Serialize};

/// Structured document analysis produced by the strategist's first step.
///
/// The analysis seeds everything downstream: the framework rule engine
/// reads the classification tags, the pyramid restates `key_message`, and
/// the analyst mines `data_points` for quantitative claims.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// One-sentence synthesis of the document.
    pub key_message: String,
    /// Salient quantitative claims, in document order, free text.
    #[serde(default)]
    pub data_points: Vec<String>,
    /// Audience classification tag.
    #[serde(default)]
    pub audience: String,
    /// Purpose classification tag.
    #[serde(default)]
    pub purpose: String,
    /// Industry classification tag.
    #[serde(default)]
    pub industry: String,
    /// Situational context tag (e.g. "market entry", "annual review").
    #[serde(default)]
    pub context: String,
}

impl Analysis {
    pub fn new(key_message: impl Into<String>) -> Self {
        Self {
            key_message: key_message.into(),
            ..Self::default()
        }
    }

    /// True when `purpose` or `context` contains any needle,
    /// case-insensitively. The framework rule engine is built on this.
    pub fn mentions(&self, needles: &[&str]) -> bool {
        let purpose = self.purpose.to_lowercase();
        let context = self.context.to_lowercase();
        needles
            .iter()
            .any(|n| purpose.contains(n) || context.contains(n))
    }
}
