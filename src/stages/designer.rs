//! Designer boundary: enriching the outline into a styled deck.
//!
//! The orchestrator treats the designer as a pure transform behind the
//! [`Designer`] trait; layout engines, font metrics, and overflow
//! policies live on the other side of it. [`ThemeDesigner`] is the
//! built-in deterministic implementation: a static layout table per
//! layout tag, body finalization per content type, and light headline
//! polishing driven by the So-What tester.

use async_trait::async_trait;

use crate::artifacts::{
    ChartSpec, ContentType, Insight, LayoutHints, LayoutType, Narrative, Outline, Region,
    SlideBody, SlideSpec, StyledDeck, StyledSlide, ThemeProfile,
};
use crate::quality::SoWhatTester;

use super::{StageContext, StageOutcome};

/// The design-application collaborator boundary.
#[async_trait]
pub trait Designer: Send + Sync {
    async fn design(
        &self,
        ctx: &StageContext,
        outline: &Outline,
        chart_specs: &[ChartSpec],
        insights: &[Insight],
        narrative: &Narrative,
    ) -> StageOutcome<StyledDeck>;
}

/// Built-in deterministic designer.
#[derive(Clone, Debug, Default)]
pub struct ThemeDesigner {
    theme: ThemeProfile,
    so_what: SoWhatTester,
}

impl ThemeDesigner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_theme(mut self, theme: ThemeProfile) -> Self {
        self.theme = theme;
        self
    }

    /// Static layout table: regions and font sizes per layout tag.
    fn hints_for(layout: LayoutType) -> LayoutHints {
        match layout {
            LayoutType::TitleSlide => LayoutHints {
                title_region: Region::new(0.08, 0.32, 0.84, 0.2),
                body_region: Region::new(0.08, 0.56, 0.84, 0.25),
                side_region: None,
                title_font_pt: 40.0,
                body_font_pt: 18.0,
            },
            LayoutType::TitleAndContent => LayoutHints {
                title_region: Region::new(0.05, 0.04, 0.9, 0.12),
                body_region: Region::new(0.05, 0.2, 0.9, 0.72),
                side_region: None,
                title_font_pt: 28.0,
                body_font_pt: 14.0,
            },
            LayoutType::ThreeColumn => LayoutHints {
                title_region: Region::new(0.05, 0.04, 0.9, 0.12),
                body_region: Region::new(0.05, 0.2, 0.9, 0.72),
                side_region: None,
                title_font_pt: 26.0,
                body_font_pt: 12.0,
            },
            LayoutType::Matrix => LayoutHints {
                title_region: Region::new(0.05, 0.04, 0.9, 0.1),
                body_region: Region::new(0.08, 0.18, 0.84, 0.74),
                side_region: None,
                title_font_pt: 26.0,
                body_font_pt: 12.0,
            },
            LayoutType::SplitTextChart => LayoutHints {
                title_region: Region::new(0.05, 0.04, 0.9, 0.12),
                body_region: Region::new(0.05, 0.2, 0.42, 0.72),
                side_region: Some(Region::new(0.52, 0.2, 0.43, 0.72)),
                title_font_pt: 26.0,
                body_font_pt: 13.0,
            },
        }
    }

    /// A headline that fails the So-What test gets the strongest
    /// available action statement appended from the slide's insight.
    fn polish_headline(&self, spec: &SlideSpec, insights: &[Insight]) -> String {
        let base = if spec.headline.trim().is_empty() {
            spec.title.clone()
        } else {
            spec.headline.clone()
        };
        if self.so_what.test(&base).passed {
            return base;
        }
        match insights.first() {
            Some(insight) => format!("{base} — {}", insight.action),
            None => base,
        }
    }

    fn body_for(
        spec: &SlideSpec,
        charts: &mut Vec<ChartSpec>,
        insights: &[Insight],
    ) -> SlideBody {
        let points = || -> Vec<String> {
            if spec.key_points.is_empty() {
                insights
                    .iter()
                    .take(2)
                    .map(|i| format!("{} ({})", i.observation, i.comparison))
                    .collect()
            } else {
                spec.key_points.clone()
            }
        };
        match spec.content_type {
            ContentType::Text => SlideBody::Text { paragraphs: points() },
            ContentType::Bullets => SlideBody::Bullets { bullets: points() },
            ContentType::Comparison => {
                let items = points();
                let half = items.len().div_ceil(2);
                let (left, right) = items.split_at(half.min(items.len()));
                SlideBody::Comparison {
                    columns: vec![
                        ("As-is".to_string(), left.to_vec()),
                        ("To-be".to_string(), right.to_vec()),
                    ],
                }
            }
            ContentType::Matrix => {
                let items = points();
                let cell = |idx: usize| items.get(idx).cloned().unwrap_or_default();
                SlideBody::Matrix {
                    row_labels: vec!["High impact".into(), "Low impact".into()],
                    col_labels: vec!["Low effort".into(), "High effort".into()],
                    cells: vec![vec![cell(0), cell(1)], vec![cell(2), cell(3)]],
                }
            }
            ContentType::Chart => match Self::take_chart(spec, charts) {
                Some(chart) => SlideBody::Chart {
                    narrative: points(),
                    chart,
                },
                None => SlideBody::Bullets { bullets: points() },
            },
            ContentType::Summary => {
                let mut supports = points();
                let statement = if supports.is_empty() {
                    spec.title.clone()
                } else {
                    supports.remove(0)
                };
                SlideBody::Summary {
                    statement,
                    supports,
                }
            }
        }
    }

    /// Hand out chart specs in order, collapsing types the renderer set
    /// cannot draw.
    fn take_chart(_spec: &SlideSpec, charts: &mut Vec<ChartSpec>) -> Option<ChartSpec> {
        if charts.is_empty() {
            return None;
        }
        let mut chart = charts.remove(0);
        chart.chart_type = chart.chart_type.renderable();
        Some(chart)
    }

    fn render_notes(narrative: &Narrative, index: usize) -> String {
        let Some(note) = narrative.speaker_notes.get(index) else {
            return String::new();
        };
        let mut parts = note.talking_points.clone();
        if !note.emphasis.trim().is_empty() {
            parts.push(format!("Emphasis: {}", note.emphasis));
        }
        for question in &note.anticipated_questions {
            parts.push(format!("Q: {question}"));
        }
        parts.join("\n")
    }
}

#[async_trait]
impl Designer for ThemeDesigner {
    async fn design(
        &self,
        ctx: &StageContext,
        outline: &Outline,
        chart_specs: &[ChartSpec],
        insights: &[Insight],
        narrative: &Narrative,
    ) -> StageOutcome<StyledDeck> {
        if let Err(error) = ctx.guard() {
            return StageOutcome::Fatal(error);
        }
        let mut charts = chart_specs.to_vec();
        let slides = outline
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                // Chart slides narrow to the insight backing the chart
                // they are about to consume; other slides see them all.
                let slide_insights: Vec<Insight> = if spec.content_type == ContentType::Chart {
                    let target = charts.first().map(|c| c.insight_id.clone());
                    insights
                        .iter()
                        .filter(|i| target.as_deref() == Some(i.data_id.as_str()))
                        .cloned()
                        .collect()
                } else {
                    insights.to_vec()
                };
                StyledSlide {
                    number: spec.number,
                    slide_type: spec.slide_type,
                    layout_type: spec.layout_type,
                    title: spec.title.clone(),
                    headline: self.polish_headline(spec, &slide_insights),
                    body: Self::body_for(spec, &mut charts, &slide_insights),
                    layout: Self::hints_for(spec.layout_type),
                    notes: Self::render_notes(narrative, index),
                }
            })
            .collect();

        StageOutcome::Ok(StyledDeck {
            slides,
            theme: self.theme.clone(),
            language: ctx.language.clone(),
        })
    }
}
