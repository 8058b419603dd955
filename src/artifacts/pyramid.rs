//! Pyramid-principle argument structure.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::framework::Framework;

/// One supporting argument, tied to a framework category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingArgument {
    /// Framework category this argument covers.
    pub category: String,
    /// The argument text, one clear claim.
    pub argument: String,
    /// 2–4 supporting claims, each ideally quantified.
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// Single-root, conclusion-first argument hierarchy.
///
/// The root restates the analysis key message in action-oriented form;
/// each framework category is backed by exactly one supporting argument.
/// That set equality is the MECE invariant, checked with
/// [`validate_against`](Self::validate_against), and fatal when violated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pyramid {
    /// Action-oriented restatement of the key message.
    pub top_message: String,
    /// One argument per framework category.
    #[serde(default)]
    pub supporting_arguments: Vec<SupportingArgument>,
}

impl Pyramid {
    /// Category set carried by the supporting arguments.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.supporting_arguments
            .iter()
            .map(|a| a.category.as_str())
            .collect()
    }

    /// Check the MECE invariant: argument categories equal the framework's
    /// category set. Returns the missing and unexpected categories on
    /// violation.
    pub fn validate_against(&self, framework: &Framework) -> Result<(), MeceViolation> {
        let have = self.categories();
        let want: BTreeSet<&str> = framework.categories.iter().map(String::as_str).collect();
        if have == want {
            return Ok(());
        }
        Err(MeceViolation {
            missing: want.difference(&have).map(|c| (*c).to_string()).collect(),
            unexpected: have.difference(&want).map(|c| (*c).to_string()).collect(),
        })
    }

    /// Argument for a given category, if present.
    pub fn argument_for(&self, category: &str) -> Option<&SupportingArgument> {
        self.supporting_arguments
            .iter()
            .find(|a| a.category == category)
    }
}

/// Details of a failed MECE check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeceViolation {
    /// Framework categories with no supporting argument.
    pub missing: Vec<String>,
    /// Argument categories the framework does not declare.
    pub unexpected: Vec<String>,
}

impl std::fmt::Display for MeceViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "missing categories {:?}, unexpected categories {:?}",
            self.missing, self.unexpected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::framework::FrameworkKind;

    fn pyramid_with(categories: &[&str]) -> Pyramid {
        Pyramid {
            top_message: "Expand now".into(),
            supporting_arguments: categories
                .iter()
                .map(|c| SupportingArgument {
                    category: (*c).to_string(),
                    argument: format!("{c} argument"),
                    evidence: vec!["evidence 1".into(), "evidence 2".into()],
                })
                .collect(),
        }
    }

    #[test]
    fn set_equality_passes() {
        let fw = Framework::from_catalog(FrameworkKind::ThreeC);
        let pyramid = pyramid_with(&["Company", "Customer", "Competitor"]);
        // Order does not matter, only set equality.
        assert!(pyramid.validate_against(&fw).is_ok());
    }

    #[test]
    fn missing_category_is_reported() {
        let fw = Framework::from_catalog(FrameworkKind::ThreeC);
        let pyramid = pyramid_with(&["Customer", "Competitor"]);
        let violation = pyramid.validate_against(&fw).unwrap_err();
        assert_eq!(violation.missing, vec!["Company".to_string()]);
        assert!(violation.unexpected.is_empty());
    }

    #[test]
    fn unexpected_category_is_reported() {
        let fw = Framework::from_catalog(FrameworkKind::ThreeC);
        let pyramid = pyramid_with(&["Customer", "Competitor", "Company", "Regulator"]);
        let violation = pyramid.validate_against(&fw).unwrap_err();
        assert_eq!(violation.unexpected, vec!["Regulator".to_string()]);
    }
}
