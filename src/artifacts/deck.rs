//! The finalized deck model handed to the slide-file emitter.

use serde::{Deserialize, Serialize};

use super::document::Language;
use super::outline::{LayoutType, SlideType};
use super::visualization::ChartSpec;

/// Rectangular region in EMU-free relative coordinates (fractions of the
/// slide surface, `0.0..=1.0` on both axes).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether two regions overlap with positive area.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Whether the region stays inside the slide surface with `margin`
    /// clearance on every side.
    pub fn respects_margin(&self, margin: f64) -> bool {
        self.x >= margin
            && self.y >= margin
            && self.x + self.width <= 1.0 - margin
            && self.y + self.height <= 1.0 - margin
    }
}

/// Positional and typographic decisions for one slide.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutHints {
    pub title_region: Region,
    pub body_region: Region,
    /// Secondary region (chart panel, right column), when the layout has
    /// one.
    pub side_region: Option<Region>,
    pub title_font_pt: f64,
    pub body_font_pt: f64,
}

/// Finalized slide body, one variant per content type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlideBody {
    Text {
        paragraphs: Vec<String>,
    },
    Bullets {
        bullets: Vec<String>,
    },
    Comparison {
        columns: Vec<(String, Vec<String>)>,
    },
    Matrix {
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        cells: Vec<Vec<String>>,
    },
    Chart {
        narrative: Vec<String>,
        chart: ChartSpec,
    },
    Summary {
        statement: String,
        supports: Vec<String>,
    },
}

/// One slide with all content, layout, and typography decided.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyledSlide {
    pub number: usize,
    pub slide_type: SlideType,
    pub layout_type: LayoutType,
    pub title: String,
    pub headline: String,
    pub body: SlideBody,
    pub layout: LayoutHints,
    /// Speaker notes rendered to plain text for the emitter.
    #[serde(default)]
    pub notes: String,
}

impl StyledSlide {
    /// All text visible on the slide, for quality scoring.
    pub fn visible_text(&self) -> String {
        let mut parts = vec![self.title.clone(), self.headline.clone()];
        match &self.body {
            SlideBody::Text { paragraphs } => parts.extend(paragraphs.iter().cloned()),
            SlideBody::Bullets { bullets } => parts.extend(bullets.iter().cloned()),
            SlideBody::Comparison { columns } => {
                for (label, rows) in columns {
                    parts.push(label.clone());
                    parts.extend(rows.iter().cloned());
                }
            }
            SlideBody::Matrix {
                row_labels,
                col_labels,
                cells,
            } => {
                parts.extend(row_labels.iter().cloned());
                parts.extend(col_labels.iter().cloned());
                for row in cells {
                    parts.extend(row.iter().cloned());
                }
            }
            SlideBody::Chart { narrative, chart } => {
                parts.extend(narrative.iter().cloned());
                parts.push(chart.title.clone());
            }
            SlideBody::Summary {
                statement,
                supports,
            } => {
                parts.push(statement.clone());
                parts.extend(supports.iter().cloned());
            }
        }
        parts.retain(|p| !p.trim().is_empty());
        parts.join("\n")
    }
}

/// Color and typography profile applied deck-wide.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeProfile {
    pub name: String,
    /// Hex colors, primary first.
    pub palette: Vec<String>,
    pub heading_font: String,
    pub body_font: String,
}

impl Default for ThemeProfile {
    fn default() -> Self {
        Self {
            name: "consulting-navy".into(),
            palette: vec![
                "#1F3864".into(),
                "#2E74B5".into(),
                "#8EAADB".into(),
                "#595959".into(),
            ],
            heading_font: "Noto Sans KR".into(),
            body_font: "Noto Sans KR".into(),
        }
    }
}

/// The deck the designer hands to the emitter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyledDeck {
    pub slides: Vec<StyledSlide>,
    pub theme: ThemeProfile,
    pub language: Language,
}

impl StyledDeck {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}
