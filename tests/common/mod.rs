#![allow(dead_code)]

//! Shared test harness: a scripted completion provider that answers each
//! stage's prompts with canned, well-formed replies, plus per-route
//! overrides for failure injection.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::json;

use deckweaver::llm::{CompletionProvider, CompletionRequest, ProviderError};
use deckweaver::pipeline::CancelHandle;

/// Stage-call routes the provider recognizes from prompt markers.
pub const ROUTES: &[&str] = &[
    "analysis",
    "pyramid",
    "outline",
    "data",
    "scr",
    "transitions",
    "transition_pair",
    "notes",
    "note_single",
];

/// One scripted behavior for a call.
#[derive(Clone, Debug)]
pub enum Reply {
    /// Return this text verbatim.
    Text(String),
    /// Report a transient provider failure.
    Transient,
    /// Report a fatal provider failure.
    Fatal,
    /// Never answer (the caller's deadline decides).
    Hang,
    /// Cancel the job mid-call, then answer normally.
    CancelJob,
}

enum Behavior {
    Always(Reply),
    Queue(VecDeque<Reply>),
}

/// Deterministic stand-in for the external completion oracle.
#[derive(Default)]
pub struct ScriptedProvider {
    overrides: Mutex<FxHashMap<&'static str, Behavior>>,
    calls: Mutex<Vec<&'static str>>,
    cancel: Mutex<Option<CancelHandle>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every call on `route` behaves as `reply`.
    pub fn always(&self, route: &'static str, reply: Reply) {
        self.overrides.lock().insert(route, Behavior::Always(reply));
    }

    /// Queue a one-shot behavior for `route`; once drained the default
    /// reply resumes.
    pub fn push(&self, route: &'static str, reply: Reply) {
        let mut overrides = self.overrides.lock();
        match overrides.get_mut(route) {
            Some(Behavior::Queue(queue)) => queue.push_back(reply),
            _ => {
                overrides.insert(route, Behavior::Queue(VecDeque::from([reply])));
            }
        }
    }

    /// Register the handle `Reply::CancelJob` fires.
    pub fn set_cancel(&self, handle: CancelHandle) {
        *self.cancel.lock() = Some(handle);
    }

    /// How many calls hit `route`.
    pub fn calls(&self, route: &str) -> usize {
        self.calls.lock().iter().filter(|r| **r == route).count()
    }

    fn next_behavior(&self, route: &'static str) -> Option<Reply> {
        let mut overrides = self.overrides.lock();
        match overrides.get_mut(route) {
            Some(Behavior::Always(reply)) => Some(reply.clone()),
            Some(Behavior::Queue(queue)) => queue.pop_front(),
            None => None,
        }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let route = route_of(&request.prompt);
        self.calls.lock().push(route);
        match self.next_behavior(route) {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Transient) => Err(ProviderError::transient("scripted 503")),
            Some(Reply::Fatal) => Err(ProviderError::fatal("scripted auth failure")),
            Some(Reply::Hang) => {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Ok(String::new())
            }
            Some(Reply::CancelJob) => {
                if let Some(handle) = self.cancel.lock().clone() {
                    handle.cancel();
                }
                Ok(default_reply(route, &request.prompt))
            }
            None => Ok(default_reply(route, &request.prompt)),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Classify a prompt by its stage markers.
pub fn route_of(prompt: &str) -> &'static str {
    if prompt.contains("Analyze the following business document") {
        "analysis"
    } else if prompt.contains("pyramid-principle structure") {
        "pyramid"
    } else if prompt.contains("-slide deck for this pyramid") {
        "outline"
    } else if prompt.contains("Extract every quantitative claim") {
        "data"
    } else if prompt.contains("Situation / Complication / Resolution") {
        "scr"
    } else if prompt.contains("Write connecting phrases") {
        "transitions"
    } else if prompt.contains("one connecting sentence") {
        "transition_pair"
    } else if prompt.contains("speaker notes for the slide") {
        "note_single"
    } else if prompt.contains("speaker notes for each slide") {
        "notes"
    } else {
        "unknown"
    }
}

/// First unsigned integer appearing after `marker` in `text`.
fn number_after(text: &str, marker: &str) -> Option<usize> {
    let at = text.find(marker)? + marker.len();
    let rest = &text[at..];
    let digits: String = rest
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Categories listed in a pyramid prompt's `Categories: a, b, c` line.
fn categories_in(prompt: &str) -> Vec<String> {
    prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix("Categories: "))
        .map(|list| list.split(',').map(|c| c.trim().to_string()).collect())
        .unwrap_or_default()
}

const INTERIOR_TITLES: &[&str] = &[
    "Market analysis: premium segment",
    "Competitor comparison",
    "ROI chart for expansion",
    "Customer demand deep dive",
    "Operating model assessment",
    "Partnership options",
];

/// Default happy-path reply per route.
pub fn default_reply(route: &str, prompt: &str) -> String {
    match route {
        "analysis" => json!({
            "key_message": "Premium segment expansion can lift revenue 25% by 2026",
            "data_points": [
                "Revenue grew 20% YoY",
                "Operating margin reached 18%",
                "Premium mix is 35% of sales"
            ],
            "audience": "executive board",
            "purpose": "growth review",
            "industry": "consumer goods",
            "context": "quarterly business update"
        })
        .to_string(),
        "pyramid" => {
            let arguments: Vec<_> = categories_in(prompt)
                .into_iter()
                .map(|category| {
                    json!({
                        "category": category,
                        "argument": format!("{category} supports accelerating the premium push"),
                        "evidence": [
                            "Revenue up 20% versus plan",
                            "Premium margin 6pp above portfolio average"
                        ]
                    })
                })
                .collect();
            json!({
                "top_message": "Accelerate premium expansion now to capture outsized growth",
                "supporting_arguments": arguments
            })
            .to_string()
        }
        "outline" => {
            let count = number_after(prompt, "Plan a ").unwrap_or(10);
            outline_reply(count, StrongOutline::default())
        }
        "data" => json!([
            {"metric": "Revenue", "value": 1200.0, "unit": "M", "period": "2024",
             "comparison": {"previous": 1000.0, "growth_rate": null, "benchmark": 1100.0},
             "context": "total company"},
            {"metric": "Operating margin", "value": 18.0, "unit": "%", "period": "2024",
             "comparison": {"previous": 15.0, "growth_rate": null, "benchmark": null},
             "context": "profitability"},
            {"metric": "Premium mix", "value": 35.0, "unit": "%", "period": "2024",
             "comparison": null, "context": "portfolio"},
            {"metric": "Churn", "value": 4.2, "unit": "%", "period": "Q4 2024",
             "comparison": {"previous": 5.1, "growth_rate": null, "benchmark": null},
             "context": "retention"},
            {"metric": "ARPU", "value": 42.0, "unit": "USD", "period": "2024",
             "comparison": {"previous": 38.0, "growth_rate": null, "benchmark": 40.0},
             "context": "monetization"},
            {"metric": "NPS", "value": 61.0, "unit": "pt", "period": "2024",
             "comparison": {"previous": 55.0, "growth_rate": null, "benchmark": null},
             "context": "satisfaction"}
        ])
        .to_string(),
        "scr" => {
            let count = number_after(prompt, "Classify these ").unwrap_or(10);
            json!({
                "situation_slides": [1, 2],
                "complication_slides": [3, 4],
                "resolution_slides": (5..=count).collect::<Vec<_>>(),
                "story_arc": "From solid momentum to the premium gap, resolved by focused investment."
            })
            .to_string()
        }
        "transitions" => {
            let count = number_after(prompt, "exactly ").unwrap_or(9);
            let entries: Vec<String> = (0..count)
                .map(|i| {
                    if i == 0 {
                        "Let us start with where the business stands today.".to_string()
                    } else {
                        format!("With that established, the next question is step {}.", i + 1)
                    }
                })
                .collect();
            serde_json::to_string(&entries).unwrap()
        }
        "transition_pair" => json!({
            "transition": "Which brings us to the next part of the argument."
        })
        .to_string(),
        "notes" => {
            let count = number_after(prompt, "exactly ").unwrap_or(10);
            let entries: Vec<_> = (0..count)
                .map(|i| {
                    json!({
                        "talking_points": [format!("Walk through the headline number on slide {}", i + 1)],
                        "emphasis": "Land the so-what before moving on",
                        "anticipated_questions": ["What is the downside case?"]
                    })
                })
                .collect();
            serde_json::to_string(&entries).unwrap()
        }
        "note_single" => json!({
            "talking_points": ["Recap the argument in one sentence"],
            "emphasis": "Keep it short",
            "anticipated_questions": ["How confident are we?"]
        })
        .to_string(),
        _ => "{}".to_string(),
    }
}

/// Knobs for the scripted outline reply.
#[derive(Clone, Debug)]
pub struct StrongOutline {
    pub headline: String,
    pub key_points: Vec<String>,
}

impl Default for StrongOutline {
    fn default() -> Self {
        Self {
            headline: "Invest now to capture the 25% premium growth opportunity".to_string(),
            key_points: vec![
                "Revenue up 20% YoY versus benchmark, driven by premium demand".to_string(),
                "First priority: recommend a 30M investment to execute the strategy".to_string(),
            ],
        }
    }
}

impl StrongOutline {
    /// Headlines that fail the So-What number check, leaving clarity weak
    /// until the designer can splice in a quantified action.
    pub fn weak_headlines() -> Self {
        Self {
            headline: "Premium mix is the key opportunity ahead".to_string(),
            ..Self::default()
        }
    }
}

/// Build an outline reply of `count` slides in the shape the strategist
/// expects. Structural tags are deliberately omitted so the deterministic
/// back-fill does its job.
pub fn outline_reply(count: usize, style: StrongOutline) -> String {
    let slides: Vec<_> = (1..=count)
        .map(|number| {
            let title = if number == 1 {
                "Premium Growth Strategy".to_string()
            } else if number == 2 {
                "Executive Summary".to_string()
            } else if number == count {
                "Next steps and roadmap".to_string()
            } else {
                INTERIOR_TITLES[(number - 3) % INTERIOR_TITLES.len()].to_string()
            };
            json!({
                "number": number,
                "title": title,
                "headline": style.headline,
                "key_points": style.key_points
            })
        })
        .collect();
    serde_json::to_string(&slides).unwrap()
}

/// Override the `data` route with metrics whose names carry digits, so
/// the ladder's action lines (and therefore polished headlines) become
/// quantified.
pub fn quantified_data_reply() -> String {
    json!([
        {"metric": "30M revenue program", "value": 30.0, "unit": "M", "period": "2025",
         "comparison": {"previous": 24.0, "growth_rate": null, "benchmark": null},
         "context": "growth program"},
        {"metric": "12pt margin plan", "value": 12.0, "unit": "pt", "period": "2025",
         "comparison": {"previous": 9.0, "growth_rate": null, "benchmark": null},
         "context": "profitability"},
        {"metric": "3 region rollout", "value": 3.0, "unit": "regions", "period": "2025",
         "comparison": {"previous": 1.0, "growth_rate": null, "benchmark": null},
         "context": "expansion"}
    ])
    .to_string()
}
