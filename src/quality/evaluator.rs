//! The weighted five-criterion rubric.

use std::collections::BTreeSet;

use tracing::info;

use crate::artifacts::{Insight, Pyramid, SlideType, StyledDeck, StyledSlide};

use super::so_what::SoWhatTester;
use super::visual::validate_slide;
use super::{
    Criterion, ImprovementHint, Priority, QualityScore, HIGH_PRIORITY_THRESHOLD, HINT_THRESHOLD,
};

const COMPARISON_KEYWORDS: &[&str] = &[
    "vs", "versus", "compared", "yoy", "up ", "down ", "higher", "lower", "average", "benchmark",
    "대비", "비교", "배", "증가", "감소", "높은", "낮은",
];

const IMPLICATION_KEYWORDS: &[&str] = &[
    "driven", "contributes", "because", "due to", "reflects", "behind", "cause",
    "원인", "기여", "영향", "결과", "때문", "요인",
];

const STRATEGY_KEYWORDS: &[&str] = &[
    "strategy", "invest", "expand", "should", "recommend", "plan", "priorit", "execute",
    "전략", "필요", "가능", "권고", "제안", "실행", "투자", "확대",
];

const ACTION_KEYWORDS: &[&str] = &[
    "recommend", "should", "invest", "launch", "execute", "implement", "improve", "prepare",
    "권고", "제안", "실행", "추진", "필요", "투자", "확대", "개선",
];

const PRIORITY_MARKERS: &[&str] = &[
    "priority", "first", "critical", "urgent", "phase 1", "p0", "p1",
    "우선", "핵심", "중요", "긴급", "최우선", "1순위",
];

const INTRO_KEYWORDS: &[&str] = &[
    "overview", "introduction", "background", "objective", "summary",
    "개요", "소개", "배경", "목적", "요약",
];

const ANALYSIS_KEYWORDS: &[&str] = &[
    "analysis", "current", "issue", "problem", "opportunity", "threat", "gap",
    "분석", "현황", "문제", "이슈", "기회", "위협",
];

const CONCLUSION_KEYWORDS: &[&str] = &[
    "conclusion", "recommend", "next step", "action", "roadmap", "summary",
    "결론", "권고", "제안", "실행", "다음 단계", "요약",
];

const BUSINESS_TERMS: &[&str] = &[
    "roi", "kpi", "strategy", "growth", "market", "margin", "value", "efficiency", "synergy",
    "전략", "성장", "시장", "경쟁", "가치", "효율", "최적화", "실행",
];

/// Scores a finalized deck against the rubric and emits improvement
/// hints for weak criteria.
#[derive(Clone, Debug)]
pub struct QualityEvaluator {
    target: f64,
    so_what: SoWhatTester,
}

impl QualityEvaluator {
    pub fn new(target: f64) -> Self {
        Self {
            target,
            so_what: SoWhatTester::new(),
        }
    }

    /// Score `deck` using the insights and pyramid that produced it.
    pub fn evaluate(
        &self,
        deck: &StyledDeck,
        insights: &[Insight],
        pyramid: &Pyramid,
    ) -> QualityScore {
        let clarity = self.clarity(deck);
        let insight = self.insight(deck, insights);
        let structure = self.structure(deck, pyramid);
        let visual = self.visual(deck);
        let actionability = self.actionability(deck);

        let total = Criterion::ALL
            .iter()
            .map(|c| {
                c.weight()
                    * match c {
                        Criterion::Clarity => clarity,
                        Criterion::Insight => insight,
                        Criterion::Structure => structure,
                        Criterion::Visual => visual,
                        Criterion::Actionability => actionability,
                    }
            })
            .sum::<f64>();

        let mut score = QualityScore {
            clarity,
            insight,
            structure,
            visual,
            actionability,
            total,
            passed: total >= self.target,
            hints: Vec::new(),
        };
        score.hints = Self::hints_for(&score);
        info!(total = %format!("{total:.3}"), passed = score.passed, "deck evaluated");
        score
    }

    /// Clarity: 0.4·so-what pass rate + 0.3·headline quality +
    /// 0.2·title/body consistency + 0.1·terminology density.
    fn clarity(&self, deck: &StyledDeck) -> f64 {
        if deck.is_empty() {
            return 0.0;
        }
        let n = deck.len() as f64;
        let mut pass_rate = 0.0;
        let mut headline_quality = 0.0;
        let mut consistency = 0.0;
        let mut terminology = 0.0;
        for slide in &deck.slides {
            let result = self.so_what.test(&slide.headline);
            if result.passed {
                pass_rate += 1.0;
            }
            headline_quality += result.score;
            consistency += title_body_consistency(slide);
            terminology += terminology_density(slide);
        }
        0.4 * (pass_rate / n) + 0.3 * (headline_quality / n) + 0.2 * (consistency / n)
            + 0.1 * (terminology / n)
    }

    /// Insight: 0.4·(detected ladder level / 4) + 0.3·quantification +
    /// 0.2·comparison keywords + 0.1·strategy keywords, per slide.
    ///
    /// A deck backed by complete four-level insights is floored at
    /// level 2: the data work happened even if a slide's wording hides it.
    fn insight(&self, deck: &StyledDeck, insights: &[Insight]) -> f64 {
        if deck.is_empty() {
            return 0.0;
        }
        let ladder_floor = if !insights.is_empty() && insights.iter().all(Insight::is_complete) {
            2
        } else {
            1
        };
        let per_slide: f64 = deck
            .slides
            .iter()
            .map(|slide| {
                let text = slide.visible_text().to_lowercase();
                let level = detect_ladder_level(&text).max(ladder_floor) as f64;
                let mut s = 0.4 * (level / 4.0);
                if has_quantification(&text) {
                    s += 0.3;
                }
                if contains_any(&text, COMPARISON_KEYWORDS) {
                    s += 0.2;
                }
                if contains_any(&text, STRATEGY_KEYWORDS) {
                    s += 0.1;
                }
                s
            })
            .sum();
        per_slide / deck.len() as f64
    }

    /// Structure: 0.40·MECE + 0.35·logical flow + 0.25·pyramid principle.
    fn structure(&self, deck: &StyledDeck, pyramid: &Pyramid) -> f64 {
        0.40 * mece_score(deck) + 0.35 * flow_score(deck) + 0.25 * pyramid_score(deck, pyramid)
    }

    /// Visual: `max(0, 1 − avg_issues_per_slide / 10)`.
    fn visual(&self, deck: &StyledDeck) -> f64 {
        if deck.is_empty() {
            return 0.5;
        }
        let issues: usize = deck
            .slides
            .iter()
            .map(|s| validate_slide(s, &deck.theme).len())
            .sum();
        let avg = issues as f64 / deck.len() as f64;
        (1.0 - avg / 10.0).max(0.0)
    }

    /// Actionability: 0.5·action keywords + 0.3·quantification +
    /// 0.2·priority markers, per slide.
    fn actionability(&self, deck: &StyledDeck) -> f64 {
        if deck.is_empty() {
            return 0.0;
        }
        let per_slide: f64 = deck
            .slides
            .iter()
            .map(|slide| {
                let text = slide.visible_text().to_lowercase();
                let mut s = 0.0;
                if contains_any(&text, ACTION_KEYWORDS) {
                    s += 0.5;
                }
                if has_quantification(&text) {
                    s += 0.3;
                }
                if contains_any(&text, PRIORITY_MARKERS) {
                    s += 0.2;
                }
                s
            })
            .sum();
        per_slide / deck.len() as f64
    }

    fn hints_for(score: &QualityScore) -> Vec<ImprovementHint> {
        Criterion::ALL
            .iter()
            .filter_map(|&criterion| {
                let sub = score.sub_score(criterion);
                if sub >= HINT_THRESHOLD {
                    return None;
                }
                let priority = if sub < HIGH_PRIORITY_THRESHOLD {
                    Priority::High
                } else {
                    Priority::Medium
                };
                Some(ImprovementHint {
                    criterion,
                    priority,
                    suggestion: suggestion_for(criterion),
                })
            })
            .collect()
    }
}

fn suggestion_for(criterion: Criterion) -> String {
    match criterion {
        Criterion::Clarity => {
            "Rewrite headlines as quantified so-what statements with a clear action".to_string()
        }
        Criterion::Insight => {
            "Push slide content up the ladder: add comparisons, causes, and recommended moves"
                .to_string()
        }
        Criterion::Structure => {
            "Tighten the MECE segmentation and lead with the conclusion before support".to_string()
        }
        Criterion::Visual => {
            "Resolve layout issues: overlapping regions, margin violations, overflowing text"
                .to_string()
        }
        Criterion::Actionability => {
            "Add concrete, prioritized recommendations with quantified impact".to_string()
        }
    }
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

fn has_quantification(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

/// Detected ladder level from slide wording: 1 observation by default,
/// bumped by comparison, implication, and strategy markers.
fn detect_ladder_level(text: &str) -> u8 {
    let mut level = 1;
    if contains_any(text, COMPARISON_KEYWORDS) {
        level = 2;
    }
    if contains_any(text, IMPLICATION_KEYWORDS) {
        level = 3;
    }
    if contains_any(text, STRATEGY_KEYWORDS) {
        level = 4;
    }
    level
}

/// Keyword overlap between title and body, scaled into `[0.3, 1.0]`.
fn title_body_consistency(slide: &StyledSlide) -> f64 {
    let title_words = keyword_set(&slide.title);
    let body_words = keyword_set(&slide.visible_text());
    if title_words.is_empty() || body_words.is_empty() {
        return 0.5;
    }
    let overlap = title_words.intersection(&body_words).count() as f64;
    let union = title_words.union(&body_words).count() as f64;
    (overlap / union * 2.0).clamp(0.3, 1.0)
}

fn keyword_set(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

/// Business-terminology density: two or more terms on a slide earn full
/// credit.
fn terminology_density(slide: &StyledSlide) -> f64 {
    let text = slide.visible_text().to_lowercase();
    let count = BUSINESS_TERMS.iter().filter(|t| text.contains(**t)).count();
    match count {
        0 => 0.5,
        1 => 0.7,
        _ => 1.0,
    }
}

/// MECE score from content-slide segment coverage and title overlap:
/// duplicated interior titles read as overlapping segments.
fn mece_score(deck: &StyledDeck) -> f64 {
    let content: Vec<&StyledSlide> = deck
        .slides
        .iter()
        .filter(|s| s.slide_type == SlideType::Content)
        .collect();
    if content.len() < 2 {
        return 1.0;
    }
    let mut penalty: f64 = 0.0;
    for (i, a) in content.iter().enumerate() {
        for b in &content[i + 1..] {
            let wa = keyword_set(&a.title);
            let wb = keyword_set(&b.title);
            if wa.is_empty() || wb.is_empty() {
                continue;
            }
            let overlap = wa.intersection(&wb).count() as f64;
            let smaller = wa.len().min(wb.len()) as f64;
            if overlap / smaller > 0.6 {
                penalty += 0.2;
            }
        }
    }
    (1.0 - penalty).max(0.0)
}

/// Logical-flow score: intro wording up front, analysis in the middle,
/// conclusion wording at the end. Floored at 0.7; a structurally pinned
/// outline never reads as chaotic.
fn flow_score(deck: &StyledDeck) -> f64 {
    if deck.slides.len() < 3 {
        return 0.7;
    }
    let first = deck.slides[1].visible_text().to_lowercase();
    let last = deck
        .slides
        .last()
        .map(|s| s.visible_text().to_lowercase())
        .unwrap_or_default();
    let middle_hits = deck.slides[1..deck.slides.len() - 1]
        .iter()
        .any(|s| contains_any(&s.visible_text().to_lowercase(), ANALYSIS_KEYWORDS));

    let mut score: f64 = 0.0;
    if contains_any(&first, INTRO_KEYWORDS) {
        score += 0.3;
    }
    if middle_hits {
        score += 0.4;
    }
    if contains_any(&last, CONCLUSION_KEYWORDS) {
        score += 0.3;
    }
    score.max(0.7)
}

/// Pyramid-principle score: conclusion stated up front (0.6) plus layered
/// support below it (0.4).
fn pyramid_score(deck: &StyledDeck, pyramid: &Pyramid) -> f64 {
    let mut score = 0.0;
    let front = deck
        .slides
        .iter()
        .take(2)
        .map(|s| s.visible_text().to_lowercase())
        .collect::<Vec<_>>()
        .join("\n");
    let top = pyramid.top_message.to_lowercase();
    let conclusion_first = contains_any(&front, CONCLUSION_KEYWORDS)
        || keyword_set(&front)
            .intersection(&keyword_set(&top))
            .next()
            .is_some();
    if conclusion_first {
        score += 0.6;
    }
    let layered = deck.slides.iter().skip(1).any(|s| {
        matches!(
            &s.body,
            crate::artifacts::SlideBody::Bullets { bullets } if bullets.len() >= 2
        ) || matches!(
            &s.body,
            crate::artifacts::SlideBody::Summary { supports, .. } if supports.len() >= 2
        )
    });
    if layered {
        score += 0.4;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{
        Language, LayoutHints, LayoutType, Region, SlideBody, ThemeProfile,
    };

    fn layout() -> LayoutHints {
        LayoutHints {
            title_region: Region::new(0.05, 0.05, 0.9, 0.12),
            body_region: Region::new(0.05, 0.22, 0.9, 0.7),
            side_region: None,
            title_font_pt: 28.0,
            body_font_pt: 14.0,
        }
    }

    fn slide(number: usize, slide_type: SlideType, title: &str, bullets: Vec<String>) -> StyledSlide {
        StyledSlide {
            number,
            slide_type,
            layout_type: LayoutType::TitleAndContent,
            title: title.to_string(),
            headline: format!("{title} — invest now to capture 20% growth opportunity"),
            body: SlideBody::Bullets { bullets },
            layout: layout(),
            notes: String::new(),
        }
    }

    fn strong_deck() -> StyledDeck {
        let bullets = vec![
            "Revenue up 20% YoY versus benchmark, driven by new products".to_string(),
            "Recommend priority investment of 30M to execute the strategy".to_string(),
        ];
        StyledDeck {
            slides: vec![
                slide(1, SlideType::Title, "Growth strategy summary", bullets.clone()),
                slide(2, SlideType::ExecutiveSummary, "Executive summary", bullets.clone()),
                slide(3, SlideType::Content, "Market analysis", bullets.clone()),
                slide(4, SlideType::Content, "Competitor comparison", bullets.clone()),
                slide(5, SlideType::NextSteps, "Recommended next steps", bullets),
            ],
            theme: ThemeProfile::default(),
            language: Language::En,
        }
    }

    fn pyramid() -> Pyramid {
        Pyramid {
            top_message: "Invest in growth strategy now".into(),
            supporting_arguments: Vec::new(),
        }
    }

    #[test]
    fn total_matches_weighted_formula() {
        let evaluator = QualityEvaluator::new(0.85);
        let score = evaluator.evaluate(&strong_deck(), &[], &pyramid());
        let expected = 0.20 * score.clarity
            + 0.25 * score.insight
            + 0.20 * score.structure
            + 0.15 * score.visual
            + 0.20 * score.actionability;
        assert!((score.total - expected).abs() < 1e-9);
    }

    #[test]
    fn strong_deck_passes_target() {
        let evaluator = QualityEvaluator::new(0.85);
        let score = evaluator.evaluate(&strong_deck(), &[], &pyramid());
        assert!(score.total >= 0.85, "total was {:.3}", score.total);
        assert!(score.passed);
    }

    #[test]
    fn weak_deck_earns_high_priority_hints() {
        let mut deck = strong_deck();
        for s in &mut deck.slides {
            s.headline = "Overview".into();
            s.body = SlideBody::Text {
                paragraphs: vec!["General remarks".into()],
            };
        }
        let evaluator = QualityEvaluator::new(0.85);
        let score = evaluator.evaluate(&deck, &[], &pyramid());
        assert!(!score.passed);
        assert!(score.high_priority_hints().next().is_some());
    }

    #[test]
    fn hints_are_tagged_below_threshold() {
        let evaluator = QualityEvaluator::new(0.99);
        let score = evaluator.evaluate(&strong_deck(), &[], &pyramid());
        for hint in &score.hints {
            assert!(score.sub_score(hint.criterion) < HINT_THRESHOLD);
        }
    }
}
