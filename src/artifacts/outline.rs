//! Slide outline: ordered slide specifications with fixed structural
//! positions.
//!
//! The outline always has the requested length, opens with a title slide
//! and an executive summary, closes with next steps, and assigns every
//! interior content slide to a MECE segment (at least one slide per
//! framework category). Missing content/layout tags are back-filled by a
//! deterministic keyword heuristic so an underspecified LLM reply still
//! yields a renderable outline.

use serde::{Deserialize, Serialize};

use super::framework::Framework;

/// Structural role of a slide within the deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideType {
    /// Slide 1: deck title.
    Title,
    /// Slide 2: executive summary of the pyramid top message.
    ExecutiveSummary,
    /// Interior content slide, tied to a MECE segment.
    Content,
    /// Final slide: recommendations / next steps.
    NextSteps,
}

/// How the slide body is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Bullets,
    Comparison,
    Matrix,
    Chart,
    Summary,
}

/// Closed set of layout tags the designer accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutType {
    TitleSlide,
    TitleAndContent,
    ThreeColumn,
    Matrix,
    SplitTextChart,
}

impl std::fmt::Display for LayoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            LayoutType::TitleSlide => "title_slide",
            LayoutType::TitleAndContent => "title_and_content",
            LayoutType::ThreeColumn => "three_column",
            LayoutType::Matrix => "matrix",
            LayoutType::SplitTextChart => "split_text_chart",
        };
        f.write_str(tag)
    }
}

/// Specification of a single slide, as planned by the strategist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSpec {
    /// 1-based slide number.
    pub number: usize,
    pub slide_type: SlideType,
    pub title: String,
    /// So-what action statement for the slide.
    #[serde(default)]
    pub headline: String,
    pub content_type: ContentType,
    pub layout_type: LayoutType,
    #[serde(default)]
    pub key_points: Vec<String>,
    /// Framework category this slide covers, for content slides.
    #[serde(default)]
    pub mece_segment: Option<String>,
}

impl SlideSpec {
    pub fn new(number: usize, slide_type: SlideType, title: impl Into<String>) -> Self {
        let title = title.into();
        let (content_type, layout_type) = classify(number, &title);
        Self {
            number,
            slide_type,
            title,
            headline: String::new(),
            content_type,
            layout_type,
            key_points: Vec::new(),
            mece_segment: None,
        }
    }
}

/// Deterministic content/layout classification from slide position and
/// title keywords. Used to back-fill tags the LLM reply omitted.
///
/// ```
/// use deckweaver::artifacts::outline::{classify, ContentType, LayoutType};
///
/// assert_eq!(
///     classify(5, "Cost comparison against peers"),
///     (ContentType::Comparison, LayoutType::ThreeColumn),
/// );
/// assert_eq!(
///     classify(1, "FY24 Strategy Review"),
///     (ContentType::Summary, LayoutType::TitleSlide),
/// );
/// ```
pub fn classify(number: usize, title: &str) -> (ContentType, LayoutType) {
    let t = title.to_lowercase();
    if contains_any(&t, &["comparison", "비교", "pros/cons"]) {
        (ContentType::Comparison, LayoutType::ThreeColumn)
    } else if contains_any(&t, &["matrix", "2x2", "3x3"]) {
        (ContentType::Matrix, LayoutType::Matrix)
    } else if contains_any(&t, &["roi", "chart", "data", "분석"]) {
        (ContentType::Chart, LayoutType::SplitTextChart)
    } else if number == 1 || contains_any(&t, &["summary", "executive"]) {
        (ContentType::Summary, LayoutType::TitleSlide)
    } else {
        (ContentType::Text, LayoutType::TitleAndContent)
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Structural problems found by [`Outline::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutlineViolation {
    LengthMismatch { want: usize, got: usize },
    MisplacedSlide { number: usize, want: SlideType },
    UncoveredCategory { category: String },
    BadNumbering { index: usize, got: usize },
}

impl std::fmt::Display for OutlineViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutlineViolation::LengthMismatch { want, got } => {
                write!(f, "outline has {got} slides, expected {want}")
            }
            OutlineViolation::MisplacedSlide { number, want } => {
                write!(f, "slide {number} must have type {want:?}")
            }
            OutlineViolation::UncoveredCategory { category } => {
                write!(f, "no content slide covers category {category:?}")
            }
            OutlineViolation::BadNumbering { index, got } => {
                write!(f, "slide at index {index} is numbered {got}")
            }
        }
    }
}

/// The ordered slide plan for one deck.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub slides: Vec<SlideSpec>,
}

impl Outline {
    pub fn new(slides: Vec<SlideSpec>) -> Self {
        Self { slides }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SlideSpec> {
        self.slides.iter()
    }

    /// Deterministically repair what the LLM reply commonly gets wrong:
    /// renumber sequentially, pin the fixed structural positions (title,
    /// executive summary, next steps), and round-robin MECE segments over
    /// interior content slides that lack one.
    ///
    /// Repair never changes the slide count; a wrong count is a fatal
    /// condition reported by [`validate`](Self::validate).
    pub fn normalize(&mut self, framework: &Framework) {
        let count = self.slides.len();
        for (idx, slide) in self.slides.iter_mut().enumerate() {
            slide.number = idx + 1;
        }
        if let Some(first) = self.slides.first_mut() {
            first.slide_type = SlideType::Title;
            first.content_type = ContentType::Summary;
            first.layout_type = LayoutType::TitleSlide;
            first.mece_segment = None;
        }
        if count >= 2 {
            let second = &mut self.slides[1];
            second.slide_type = SlideType::ExecutiveSummary;
            second.content_type = ContentType::Summary;
            second.mece_segment = None;
        }
        if count >= 3 {
            let last = self.slides.last_mut().expect("non-empty outline");
            last.slide_type = SlideType::NextSteps;
            last.mece_segment = None;
        }

        // Interior slides: make sure every framework category gets at
        // least one slide, then fill remaining gaps round-robin.
        let interior = 2..count.saturating_sub(1);
        let categories = &framework.categories;
        if categories.is_empty() || interior.is_empty() {
            return;
        }
        for slide in &mut self.slides[interior.clone()] {
            slide.slide_type = SlideType::Content;
            if let Some(segment) = &slide.mece_segment
                && !categories.contains(segment)
            {
                slide.mece_segment = None;
            }
        }
        let mut next_category = 0usize;
        for category in categories {
            let covered = self.slides[interior.clone()]
                .iter()
                .any(|s| s.mece_segment.as_deref() == Some(category.as_str()));
            if covered {
                continue;
            }
            if let Some(slide) = self.slides[interior.clone()]
                .iter_mut()
                .find(|s| s.mece_segment.is_none())
            {
                slide.mece_segment = Some(category.clone());
                continue;
            }
            // No unassigned slide left: take one from an over-represented
            // category so every category still gets at least one slide.
            let duplicated = self.slides[interior.clone()].iter().find_map(|s| {
                let segment = s.mece_segment.clone()?;
                let copies = self.slides[interior.clone()]
                    .iter()
                    .filter(|o| o.mece_segment.as_deref() == Some(segment.as_str()))
                    .count();
                (copies > 1).then_some(segment)
            });
            if let Some(segment) = duplicated
                && let Some(slide) = self.slides[interior.clone()]
                    .iter_mut()
                    .find(|s| s.mece_segment.as_deref() == Some(segment.as_str()))
            {
                slide.mece_segment = Some(category.clone());
            }
        }
        for slide in &mut self.slides[interior] {
            if slide.mece_segment.is_none() {
                slide.mece_segment = Some(categories[next_category % categories.len()].clone());
                next_category += 1;
            }
        }
    }

    /// Check the structural invariants against the requested slide count
    /// and framework. Violations other than a length mismatch are
    /// repairable with [`normalize`](Self::normalize); the length mismatch
    /// is fatal.
    pub fn validate(
        &self,
        num_slides: usize,
        framework: &Framework,
    ) -> Result<(), OutlineViolation> {
        if self.slides.len() != num_slides {
            return Err(OutlineViolation::LengthMismatch {
                want: num_slides,
                got: self.slides.len(),
            });
        }
        for (index, slide) in self.slides.iter().enumerate() {
            if slide.number != index + 1 {
                return Err(OutlineViolation::BadNumbering {
                    index,
                    got: slide.number,
                });
            }
        }
        if self.slides[0].slide_type != SlideType::Title {
            return Err(OutlineViolation::MisplacedSlide {
                number: 1,
                want: SlideType::Title,
            });
        }
        if self.slides[self.slides.len() - 1].slide_type != SlideType::NextSteps {
            return Err(OutlineViolation::MisplacedSlide {
                number: self.slides.len(),
                want: SlideType::NextSteps,
            });
        }
        // Interior slides must cover every framework category when there
        // is room for them.
        let interior = &self.slides[2..self.slides.len() - 1];
        if interior.len() >= framework.categories.len() {
            for category in &framework.categories {
                let covered = interior
                    .iter()
                    .any(|s| s.mece_segment.as_deref() == Some(category.as_str()));
                if !covered {
                    return Err(OutlineViolation::UncoveredCategory {
                        category: category.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
