//! Analyst: data extraction, insight ladder, visualization mapping.
//!
//! This is the one stage that tolerates total LLM failure: an empty
//! extraction degrades to deterministic fallback data synthesized from
//! numeric tokens in the document, because a deck without any analyst
//! output could be neither charted nor quality-scored. The degradation is
//! always flagged, never silent.

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{info, warn};

use crate::artifacts::{ChartSpec, ChartType, Comparison, DataPoint, Insight, InsightKind};
use crate::llm::{extract_json, CompletionRequest, ExpectedShape};
use crate::prompts;

use super::{ladder, StageContext, StageError, StageOutcome};

const STAGE: &str = "analyst";

/// Reason string attached when fallback data was synthesized.
pub const FALLBACK_REASON: &str = "analyst_fallback_data";

/// Minimum number of data points the fallback guarantees.
const FALLBACK_MIN_POINTS: usize = 3;

#[derive(Clone, Debug)]
pub struct AnalystOutput {
    pub data_points: Vec<DataPoint>,
    pub insights: Vec<Insight>,
    pub chart_specs: Vec<ChartSpec>,
}

pub struct Analyst;

impl Analyst {
    pub async fn run(ctx: &StageContext, document: &str) -> StageOutcome<AnalystOutput> {
        let (data_points, degraded) = match Self::extract(ctx, document).await {
            Ok(points) if !points.is_empty() => (points, false),
            Ok(_) => {
                warn!(job_id = %ctx.job_id, "no valid data points extracted, synthesizing");
                (Self::fallback_data(document, ctx), true)
            }
            Err(error) if error.is_aborted() => return StageOutcome::Fatal(error),
            Err(error) => {
                warn!(job_id = %ctx.job_id, %error, "extraction failed, synthesizing");
                (Self::fallback_data(document, ctx), true)
            }
        };

        let insights: Vec<Insight> = data_points
            .iter()
            .map(|dp| ladder::climb(dp, &ctx.language))
            .collect();
        let chart_specs: Vec<ChartSpec> = data_points
            .iter()
            .zip(&insights)
            .map(|(dp, insight)| Self::chart_for(dp, insight))
            .collect();

        info!(
            job_id = %ctx.job_id,
            points = data_points.len(),
            charts = chart_specs.len(),
            degraded,
            "analysis complete"
        );

        let output = AnalystOutput {
            data_points,
            insights,
            chart_specs,
        };
        if degraded {
            StageOutcome::Degraded(output, FALLBACK_REASON.to_string())
        } else {
            StageOutcome::Ok(output)
        }
    }

    /// LLM extraction with per-candidate validation. Invalid candidates
    /// are dropped; survivors get sequential ids.
    async fn extract(ctx: &StageContext, document: &str) -> Result<Vec<DataPoint>, StageError> {
        let prompt = prompts::data_extraction(document, &ctx.language);
        let reply = ctx.generate(STAGE, CompletionRequest::new(prompt)).await?;
        let value = extract_json(&reply, ExpectedShape::Array)
            .map_err(|source| StageError::Parse { stage: STAGE, source })?;
        let Value::Array(items) = value else {
            return Ok(Vec::new());
        };

        let mut points: Vec<DataPoint> = items.iter().filter_map(Self::coerce_datum).collect();
        for (idx, point) in points.iter_mut().enumerate() {
            point.id = DataPoint::sequential_id(idx);
        }
        Ok(points)
    }

    /// Lenient coercion of one candidate datum: the value may arrive as a
    /// JSON number or a numeric string. Returns `None` when validation
    /// fails.
    fn coerce_datum(item: &Value) -> Option<DataPoint> {
        let obj = item.as_object()?;
        let value = match obj.get("value") {
            Some(Value::Number(n)) => n.as_f64()?,
            Some(Value::String(s)) => s.trim().replace(',', "").parse().ok()?,
            _ => return None,
        };
        let text = |key: &str| -> String {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string()
        };
        let comparison = obj.get("comparison").and_then(|c| {
            let cmp: Comparison = serde_json::from_value(c.clone()).ok()?;
            (!cmp.is_empty()).then_some(cmp)
        });
        let drivers: FxHashMap<String, f64> = obj
            .get("drivers")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_f64().map(|pct| (k.clone(), pct)))
                    .collect()
            })
            .unwrap_or_default();

        let point = DataPoint {
            id: String::new(),
            metric: text("metric"),
            value,
            unit: text("unit"),
            period: text("period"),
            comparison,
            drivers,
            context: text("context"),
        };
        point.is_valid().then_some(point)
    }

    /// Deterministic fallback: scan numeric tokens out of the
    /// document and pad with neutral estimates up to the minimum count.
    /// Unknown fields get neutral defaults: unit `%`, period `Current`,
    /// a synthetic prior period implying modest growth.
    fn fallback_data(document: &str, ctx: &StageContext) -> Vec<DataPoint> {
        let ko = ctx.language.is_korean();
        let mut points: Vec<DataPoint> = scan_numbers(document)
            .into_iter()
            .take(FALLBACK_MIN_POINTS)
            .enumerate()
            .map(|(idx, value)| DataPoint {
                id: DataPoint::sequential_id(idx),
                metric: if ko {
                    format!("핵심 지표 {}", idx + 1)
                } else {
                    format!("Key metric {}", idx + 1)
                },
                value,
                unit: "%".to_string(),
                period: "Current".to_string(),
                comparison: Some(Comparison {
                    previous: Some(value / 1.1),
                    growth_rate: None,
                    benchmark: None,
                }),
                drivers: FxHashMap::default(),
                context: if ko {
                    "문서에서 추출한 수치".to_string()
                } else {
                    "Scanned from document".to_string()
                },
            })
            .collect();

        let padding = [12.0, 8.0, 5.0];
        let mut pad = padding.iter();
        while points.len() < FALLBACK_MIN_POINTS {
            let idx = points.len();
            let value = *pad.next().unwrap_or(&10.0);
            points.push(DataPoint {
                id: DataPoint::sequential_id(idx),
                metric: if ko {
                    format!("추정 지표 {}", idx + 1)
                } else {
                    format!("Estimated metric {}", idx + 1)
                },
                value,
                unit: "%".to_string(),
                period: "Current".to_string(),
                comparison: Some(Comparison {
                    previous: Some(value / 1.1),
                    growth_rate: None,
                    benchmark: None,
                }),
                drivers: FxHashMap::default(),
                context: if ko {
                    "데이터 부재로 생성된 추정치".to_string()
                } else {
                    "Synthesized in the absence of source data".to_string()
                },
            });
        }
        points
    }

    /// Map one insight to a chart spec. When concrete comparison
    /// data is missing, a bounded synthetic series keeps the deck
    /// renderable; flagged via `synthetic`, noted but not an error.
    fn chart_for(dp: &DataPoint, insight: &Insight) -> ChartSpec {
        let chart_type = match insight.kind {
            InsightKind::Comparison => ChartType::Bar,
            InsightKind::Trend => ChartType::Line,
            InsightKind::Composition => ChartType::Pie,
            InsightKind::Observation => ChartType::Bar,
        };

        let period = if dp.period.trim().is_empty() {
            "Current".to_string()
        } else {
            dp.period.trim().to_string()
        };

        let (labels, values, synthetic) = match (insight.kind, &dp.comparison) {
            (InsightKind::Composition, _) if dp.value <= 100.0 => (
                vec![dp.metric.clone(), "Others".to_string()],
                vec![dp.value, (100.0 - dp.value).max(0.0)],
                false,
            ),
            (_, Some(cmp)) if cmp.previous.is_some() => {
                let previous = cmp.previous.unwrap_or_default();
                let mut labels = vec!["Previous".to_string(), period];
                let mut values = vec![previous, dp.value];
                if let Some(benchmark) = cmp.benchmark {
                    labels.push("Benchmark".to_string());
                    values.push(benchmark);
                }
                (labels, values, false)
            }
            _ => (
                vec!["T-2".to_string(), "T-1".to_string(), period],
                vec![dp.value * 0.8, dp.value * 0.9, dp.value],
                true,
            ),
        };

        ChartSpec {
            chart_type,
            title: dp.metric.clone(),
            labels,
            values,
            insight_id: dp.id.clone(),
            synthetic,
        }
    }
}

/// Pull numeric tokens (optionally decimal) out of free text. Commas are
/// treated as thousands separators when embedded in a number.
fn scan_numbers(text: &str) -> Vec<f64> {
    let mut numbers = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() || (ch == '.' && !current.is_empty() && !current.contains('.')) {
            current.push(ch);
        } else if ch == ',' && !current.is_empty() {
            // swallow separators inside a number
        } else if !current.is_empty() {
            if let Ok(value) = current.trim_end_matches('.').parse::<f64>() {
                numbers.push(value);
            }
            current.clear();
        }
    }
    if !current.is_empty()
        && let Ok(value) = current.trim_end_matches('.').parse::<f64>()
    {
        numbers.push(value);
    }
    numbers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scan_numbers_handles_decimals_and_separators() {
        let numbers = scan_numbers("Revenue 1,200 grew 12.5% in 2024.");
        assert_eq!(numbers, vec![1200.0, 12.5, 2024.0]);
    }

    #[test]
    fn coerce_accepts_string_values() {
        let datum = json!({
            "metric": "Margin",
            "value": "23.4",
            "unit": "%",
            "period": "2024"
        });
        let point = Analyst::coerce_datum(&datum).unwrap();
        assert_eq!(point.value, 23.4);
    }

    #[test]
    fn coerce_drops_invalid_candidates() {
        let missing_unit = json!({"metric": "Margin", "value": 10.0, "unit": ""});
        assert!(Analyst::coerce_datum(&missing_unit).is_none());
        let bad_value = json!({"metric": "Margin", "value": "high", "unit": "%"});
        assert!(Analyst::coerce_datum(&bad_value).is_none());
    }

    #[test]
    fn empty_comparison_object_is_dropped() {
        let datum = json!({
            "metric": "Margin",
            "value": 10.0,
            "unit": "%",
            "comparison": {"previous": null, "growth_rate": null, "benchmark": null}
        });
        let point = Analyst::coerce_datum(&datum).unwrap();
        assert!(point.comparison.is_none());
    }

    #[test]
    fn synthetic_series_is_flagged_and_bounded() {
        let dp = DataPoint {
            id: "data_001".into(),
            metric: "Headcount".into(),
            value: 400.0,
            unit: "FTE".into(),
            period: "latest".into(),
            ..DataPoint::default()
        };
        let insight = ladder::climb(&dp, &crate::artifacts::Language::En);
        let chart = Analyst::chart_for(&dp, &insight);
        assert!(chart.synthetic);
        assert!(chart.is_well_formed());
        assert_eq!(chart.values.last().copied(), Some(400.0));
    }

    #[test]
    fn composition_maps_to_pie_with_remainder() {
        let dp = DataPoint {
            id: "data_001".into(),
            metric: "Market share".into(),
            value: 35.0,
            unit: "%".into(),
            period: String::new(),
            ..DataPoint::default()
        };
        let insight = ladder::climb(&dp, &crate::artifacts::Language::En);
        let chart = Analyst::chart_for(&dp, &insight);
        assert_eq!(chart.chart_type, ChartType::Pie);
        assert_eq!(chart.values, vec![35.0, 65.0]);
        assert!(!chart.synthetic);
    }
}
