//! Storyteller output: narrative arc, transitions, and speaker notes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Situation / Complication / Resolution partition of the deck.
///
/// The three sets are pairwise disjoint and together cover `1..=N`. The
/// title slide belongs to `situation`, the final slide to `resolution`
/// (fixed per deployment; see DESIGN.md).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrStructure {
    pub situation_slides: Vec<usize>,
    pub complication_slides: Vec<usize>,
    pub resolution_slides: Vec<usize>,
}

/// Ways an SCR partition can be malformed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScrViolation {
    Overlap { slide: usize },
    Gap { slide: usize },
    OutOfRange { slide: usize },
}

impl std::fmt::Display for ScrViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrViolation::Overlap { slide } => write!(f, "slide {slide} assigned twice"),
            ScrViolation::Gap { slide } => write!(f, "slide {slide} not assigned"),
            ScrViolation::OutOfRange { slide } => write!(f, "slide {slide} out of range"),
        }
    }
}

impl ScrStructure {
    /// Deterministic partition by slide count, used when the LLM-based
    /// assignment times out:
    ///
    /// | slide count | situation ends | complication ends |
    /// |-------------|----------------|-------------------|
    /// | ≤ 10        | 2              | 4                 |
    /// | 11–15       | 3              | 5                 |
    /// | > 15        | 4              | 7                 |
    ///
    /// Resolution runs from there through the final slide.
    pub fn deterministic(slide_count: usize) -> Self {
        let (situation_end, complication_end) = if slide_count <= 10 {
            (2, 4)
        } else if slide_count <= 15 {
            (3, 5)
        } else {
            (4, 7)
        };
        let situation_end = situation_end.min(slide_count);
        let complication_end = complication_end.min(slide_count);
        Self {
            situation_slides: (1..=situation_end).collect(),
            complication_slides: (situation_end + 1..=complication_end).collect(),
            resolution_slides: (complication_end + 1..=slide_count).collect(),
        }
    }

    /// Verify the partition invariant for a deck of `slide_count` slides.
    pub fn validate(&self, slide_count: usize) -> Result<(), ScrViolation> {
        let mut seen = BTreeSet::new();
        for &slide in self
            .situation_slides
            .iter()
            .chain(&self.complication_slides)
            .chain(&self.resolution_slides)
        {
            if slide == 0 || slide > slide_count {
                return Err(ScrViolation::OutOfRange { slide });
            }
            if !seen.insert(slide) {
                return Err(ScrViolation::Overlap { slide });
            }
        }
        for slide in 1..=slide_count {
            if !seen.contains(&slide) {
                return Err(ScrViolation::Gap { slide });
            }
        }
        Ok(())
    }

    /// Which section a slide belongs to: `"situation"`, `"complication"`,
    /// or `"resolution"`.
    pub fn section_of(&self, slide: usize) -> Option<&'static str> {
        if self.situation_slides.contains(&slide) {
            Some("situation")
        } else if self.complication_slides.contains(&slide) {
            Some("complication")
        } else if self.resolution_slides.contains(&slide) {
            Some("resolution")
        } else {
            None
        }
    }
}

/// Speaker notes for one slide.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerNote {
    /// What to say, in order.
    #[serde(default)]
    pub talking_points: Vec<String>,
    /// The single point to land.
    #[serde(default)]
    pub emphasis: String,
    /// Questions the audience is likely to ask.
    #[serde(default)]
    pub anticipated_questions: Vec<String>,
}

impl SpeakerNote {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            talking_points: vec![text.into()],
            ..Self::default()
        }
    }
}

/// The storyteller's complete narrative for a deck of N slides:
/// an SCR partition, N−1 connecting transitions (the first entry is the
/// opening sentence), N speaker notes, and a short story-arc summary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub scr: ScrStructure,
    pub transitions: Vec<String>,
    pub speaker_notes: Vec<SpeakerNote>,
    pub story_arc: String,
}
