//! The insight ladder: observation → comparison → implication → action.
//!
//! A pure function of the data point and the configured language: no LLM
//! calls, no clock, no randomness. Every validated data point yields
//! exactly one [`Insight`] with four non-empty levels and a confidence in
//! `[0, 1]`.
//!
//! Level rules:
//!
//! | Level | Content |
//! |-------|---------|
//! | 1 observation | period + metric + formatted value |
//! | 2 comparison | growth vs. prior period and/or benchmark ratio; neutral phrasing at confidence 0.6 when no comparison data exists |
//! | 3 implication | largest named driver, else inferred from comparison polarity |
//! | 4 action | recommendation template keyed on the implication pattern |

use crate::artifacts::{DataPoint, Insight, InsightKind, Language};

/// Benchmark ratios within ±20% of 1.0 are treated as "at industry level"
/// and not called out.
const BENCHMARK_SALIENCE: f64 = 0.2;

/// Climb the four levels for one validated data point.
///
/// # Examples
///
/// ```
/// use deckweaver::artifacts::{Comparison, DataPoint, Language};
/// use deckweaver::stages::ladder::climb;
///
/// let dp = DataPoint {
///     id: "data_001".into(),
///     metric: "Revenue".into(),
///     value: 120.0,
///     unit: "M".into(),
///     period: "2024".into(),
///     comparison: Some(Comparison {
///         previous: Some(100.0),
///         growth_rate: None,
///         benchmark: None,
///     }),
///     ..DataPoint::default()
/// };
/// let insight = climb(&dp, &Language::En);
/// assert!(insight.is_complete());
/// assert!(insight.comparison.contains("20.0%"));
/// ```
pub fn climb(dp: &DataPoint, language: &Language) -> Insight {
    let ko = language.is_korean();
    let observation = observation_level(dp, ko);
    let (comparison, growth, has_comparison) = comparison_level(dp, ko);
    let implication = implication_level(dp, growth, has_comparison, ko);
    let action = action_level(dp, &implication, ko);

    let confidence = if !dp.drivers.is_empty() {
        0.85
    } else if has_comparison {
        0.75
    } else {
        0.6
    };

    Insight {
        data_id: dp.id.clone(),
        kind: classify(dp),
        observation,
        comparison,
        implication,
        action,
        confidence,
    }
}

/// Chart-type classification: growth data → comparison, dated
/// periods → trend, bounded percentages → composition, else observation.
pub fn classify(dp: &DataPoint) -> InsightKind {
    let has_growth = dp
        .comparison
        .as_ref()
        .is_some_and(|c| c.effective_growth_rate(dp.value).is_some());
    if has_growth {
        return InsightKind::Comparison;
    }
    if has_period_marker(&dp.period) {
        return InsightKind::Trend;
    }
    if dp.unit.trim() == "%" && dp.value <= 100.0 {
        return InsightKind::Composition;
    }
    InsightKind::Observation
}

fn has_period_marker(period: &str) -> bool {
    let p = period.to_lowercase();
    let quarterish = ["q1", "q2", "q3", "q4", "분기", "quarter", "fy", "년", "월"];
    if quarterish.iter().any(|m| p.contains(m)) {
        return true;
    }
    // Four-digit year anywhere in the period tag.
    p.as_bytes()
        .windows(4)
        .any(|w| w.iter().all(u8::is_ascii_digit))
}

fn observation_level(dp: &DataPoint, ko: bool) -> String {
    let value = format_number(dp.value, &dp.unit, ko);
    let period = if dp.period.trim().is_empty() {
        if ko { "현재" } else { "Current" }
    } else {
        dp.period.trim()
    };
    if ko {
        format!("{period} {metric} {value}", metric = dp.metric)
    } else {
        format!("{period} {metric} is {value}", metric = dp.metric)
    }
}

/// Returns the statement, the growth rate (if any), and whether any
/// comparison data was available.
fn comparison_level(dp: &DataPoint, ko: bool) -> (String, Option<f64>, bool) {
    let mut parts = Vec::new();
    let mut growth = None;

    if let Some(cmp) = &dp.comparison {
        if let Some(rate) = cmp.effective_growth_rate(dp.value) {
            growth = Some(rate);
            let magnitude = rate.abs();
            let part = if ko {
                if rate >= 0.0 {
                    format!("전년 대비 {magnitude:.1}% 증가")
                } else {
                    format!("전년 대비 {magnitude:.1}% 감소")
                }
            } else if rate >= 0.0 {
                format!("Up {magnitude:.1}% YoY")
            } else {
                format!("Down {magnitude:.1}% YoY")
            };
            parts.push(part);
        }
        if let Some(ratio) = cmp.benchmark_ratio(dp.value)
            && (ratio - 1.0).abs() >= BENCHMARK_SALIENCE
        {
            let part = if ko {
                format!("업계 평균 대비 {ratio:.1}배")
            } else {
                format!("{ratio:.1}x industry average")
            };
            parts.push(part);
        }
    }

    if parts.is_empty() {
        let statement = if ko {
            format!("{} 높은 수준 유지", dp.metric)
        } else {
            format!("{} at elevated level", dp.metric)
        };
        (statement, None, false)
    } else {
        (parts.join(", "), growth, true)
    }
}

fn implication_level(dp: &DataPoint, growth: Option<f64>, has_comparison: bool, ko: bool) -> String {
    if let Some((driver, pct)) = dp.main_driver() {
        return if ko {
            format!("{driver}이(가) {metric} 변화의 {pct:.0}% 기여", metric = dp.metric)
        } else {
            format!("{driver} contributes {pct:.0}% of the change in {metric}", metric = dp.metric)
        };
    }
    match growth {
        Some(rate) if rate > 0.0 => {
            if ko {
                "시장 확대 및 제품 경쟁력 강화가 주요 원인".to_string()
            } else {
                "Driven by market expansion and product strength".to_string()
            }
        }
        Some(rate) if rate < 0.0 => {
            if ko {
                "시장 환경 악화 또는 경쟁 심화가 주요 원인".to_string()
            } else {
                "Reflects market deterioration or competitive pressure".to_string()
            }
        }
        _ if has_comparison => {
            if ko {
                "복합적 요인에 의한 결과로 추정".to_string()
            } else {
                "Mixed factors behind the flat result".to_string()
            }
        }
        _ => {
            if ko {
                "추세 판단을 위한 비교 데이터 보강 필요".to_string()
            } else {
                "Comparison data needed to attribute the level".to_string()
            }
        }
    }
}

/// Pattern-match the implication for contribution / growth / decline /
/// competition / market and map to a recommendation template on the
/// metric. First match wins.
fn action_level(dp: &DataPoint, implication: &str, ko: bool) -> String {
    let metric = &dp.metric;
    let text = implication.to_lowercase();
    let has = |en: &str, kr: &str| text.contains(en) || text.contains(kr);

    if has("contribute", "기여") {
        let driver = dp.main_driver().map(|(name, _)| name.to_string());
        match (driver, ko) {
            (Some(driver), true) => format!("{driver} 영역 투자 확대로 {metric} 추가 성장 가능"),
            (Some(driver), false) => {
                format!("Scale investment in {driver} to extend {metric} growth")
            }
            (None, true) => format!("핵심 성장 동력 강화로 {metric} 지속 성장 가능"),
            (None, false) => format!("Reinforce the core growth driver behind {metric}"),
        }
    } else if has("expansion", "확대") || has("growth", "증가") {
        if ko {
            format!("성장 모멘텀 유지를 위한 선제적 투자로 {metric} 극대화 필요")
        } else {
            format!("Invest ahead of demand to sustain the {metric} momentum")
        }
    } else if has("deterioration", "악화") || has("decline", "감소") {
        if ko {
            format!("{metric} 개선을 위한 즉각적 대응 조치 및 구조 개선 필요")
        } else {
            format!("Launch immediate countermeasures and structural fixes for {metric}")
        }
    } else if has("competiti", "경쟁") {
        if ko {
            "경쟁 우위 확보를 위한 차별화 전략 수립 필요".to_string()
        } else {
            "Build a differentiation strategy to defend competitive position".to_string()
        }
    } else if has("market", "시장") {
        if ko {
            "시장 변화 대응 전략 마련 및 신속한 실행 필요".to_string()
        } else {
            "Prepare and execute a market-response plan quickly".to_string()
        }
    } else if ko {
        format!("{metric} 최적화를 위한 전략적 접근 및 투자 필요")
    } else {
        format!("Take a structured approach to optimizing {metric}")
    }
}

/// Locale-aware number formatting. Korean output uses 억/조 scale words;
/// everything else gets thousands separators. The unit is appended.
///
/// ```
/// use deckweaver::stages::ladder::format_number;
///
/// assert_eq!(format_number(1_234_567.0, "원", true), "123.5억원");
/// assert_eq!(format_number(1_234_567.0, " USD", false), "1,234,567 USD");
/// assert_eq!(format_number(12.5, "%", false), "12.5%");
/// ```
pub fn format_number(value: f64, unit: &str, korean: bool) -> String {
    if korean && value.abs() >= 10_000.0 {
        let eok = value / 10_000.0;
        if eok.abs() >= 10_000.0 {
            return format!("{:.1}조{unit}", eok / 10_000.0);
        }
        return format!("{eok:.1}억{unit}");
    }
    if value.abs() >= 1_000.0 {
        return format!("{}{unit}", thousands(value));
    }
    if (value - value.trunc()).abs() < f64::EPSILON {
        format!("{value:.0}{unit}")
    } else {
        format!("{value:.1}{unit}")
    }
}

fn thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
