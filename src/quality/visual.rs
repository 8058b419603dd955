//! Visual validation of styled slides.
//!
//! Mirrors what a deck reviewer flags at a glance: inconsistent fonts,
//! text that cannot fit its region, overlapping regions, and margin
//! violations. Issues feed the visual sub-score as
//! `max(0, 1 − avg_issues_per_slide / 10)`.

use serde::{Deserialize, Serialize};

use crate::artifacts::{StyledSlide, ThemeProfile};

/// Slide-surface margin every region must respect.
const MARGIN: f64 = 0.02;
/// Acceptable title font range in points.
const TITLE_FONT_RANGE: (f64, f64) = (18.0, 44.0);
/// Acceptable body font range in points.
const BODY_FONT_RANGE: (f64, f64) = (10.0, 28.0);
/// Rough capacity: characters a unit of body area holds at ~12pt.
const CHARS_PER_AREA: f64 = 2400.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
}

/// One flagged problem on one slide.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualIssue {
    pub slide: usize,
    pub severity: Severity,
    pub description: String,
}

/// Validate one slide against the theme. Returns all issues found.
pub fn validate_slide(slide: &StyledSlide, _theme: &ThemeProfile) -> Vec<VisualIssue> {
    let mut issues = Vec::new();
    let layout = &slide.layout;

    if !(TITLE_FONT_RANGE.0..=TITLE_FONT_RANGE.1).contains(&layout.title_font_pt) {
        issues.push(VisualIssue {
            slide: slide.number,
            severity: Severity::Warning,
            description: format!("title font {}pt outside range", layout.title_font_pt),
        });
    }
    if !(BODY_FONT_RANGE.0..=BODY_FONT_RANGE.1).contains(&layout.body_font_pt) {
        issues.push(VisualIssue {
            slide: slide.number,
            severity: Severity::Warning,
            description: format!("body font {}pt outside range", layout.body_font_pt),
        });
    }

    for (name, region) in [
        ("title", &layout.title_region),
        ("body", &layout.body_region),
    ] {
        if !region.respects_margin(MARGIN) {
            issues.push(VisualIssue {
                slide: slide.number,
                severity: Severity::Warning,
                description: format!("{name} region violates margins"),
            });
        }
    }
    if let Some(side) = &layout.side_region {
        if !side.respects_margin(MARGIN) {
            issues.push(VisualIssue {
                slide: slide.number,
                severity: Severity::Warning,
                description: "side region violates margins".to_string(),
            });
        }
        if side.overlaps(&layout.body_region) {
            issues.push(VisualIssue {
                slide: slide.number,
                severity: Severity::Critical,
                description: "side region overlaps body".to_string(),
            });
        }
    }
    if layout.title_region.overlaps(&layout.body_region) {
        issues.push(VisualIssue {
            slide: slide.number,
            severity: Severity::Critical,
            description: "title region overlaps body".to_string(),
        });
    }

    // Overflow estimate: body text versus what the region can hold at the
    // configured font size.
    let body_chars = slide.visible_text().chars().count() as f64;
    let area = layout.body_region.width * layout.body_region.height;
    let capacity = area * CHARS_PER_AREA * (12.0 / layout.body_font_pt.max(1.0));
    if body_chars > capacity {
        issues.push(VisualIssue {
            slide: slide.number,
            severity: Severity::Critical,
            description: format!("body text overflows region ({body_chars:.0} chars)"),
        });
    }

    issues
}
