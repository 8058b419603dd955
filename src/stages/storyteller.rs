//! Storyteller: SCR narrative arc, transitions, speaker notes.
//!
//! Failure policy differs per sub-step. The SCR assignment may fall back
//! to a deterministic partition (degraded, pipeline continues).
//! Transitions and speaker notes have no heuristic substitute: they are
//! a visible product of the narrative, and fabricating them silently
//! would break the deck's voice, so irrecoverable generation failure is
//! fatal.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::artifacts::{Narrative, Outline, Pyramid, ScrStructure, SpeakerNote};
use crate::llm::{extract_json, CompletionRequest, ExpectedShape};
use crate::prompts;

use super::{StageContext, StageError, StageOutcome};

const STAGE: &str = "storyteller";

/// Reason string attached when the SCR arc came from the deterministic
/// partition instead of the LLM.
pub const SCR_FALLBACK_REASON: &str = "scr_fallback_partition";

/// Attempt budget for the SCR sub-step.
const SCR_ATTEMPTS: u32 = 3;

#[derive(Debug, Deserialize)]
struct RawScr {
    #[serde(default)]
    situation_slides: Vec<usize>,
    #[serde(default)]
    complication_slides: Vec<usize>,
    #[serde(default)]
    resolution_slides: Vec<usize>,
    #[serde(default)]
    story_arc: String,
}

pub struct Storyteller;

impl Storyteller {
    pub async fn run(
        ctx: &StageContext,
        outline: &Outline,
        pyramid: &Pyramid,
    ) -> StageOutcome<Narrative> {
        let (scr, story_arc, scr_degraded) = match Self::scr(ctx, outline, pyramid).await {
            Ok(parts) => parts,
            Err(error) => return StageOutcome::Fatal(error),
        };

        let transitions = match Self::transitions(ctx, outline).await {
            Ok(transitions) => transitions,
            Err(error) => return StageOutcome::Fatal(error),
        };
        let speaker_notes = match Self::speaker_notes(ctx, outline).await {
            Ok(notes) => notes,
            Err(error) => return StageOutcome::Fatal(error),
        };

        let narrative = Narrative {
            scr,
            transitions,
            speaker_notes,
            story_arc,
        };
        if scr_degraded {
            StageOutcome::Degraded(narrative, SCR_FALLBACK_REASON.to_string())
        } else {
            StageOutcome::Ok(narrative)
        }
    }

    /// SCR assignment: up to three LLM attempts under the short deadline,
    /// then the deterministic partition by slide count.
    async fn scr(
        ctx: &StageContext,
        outline: &Outline,
        pyramid: &Pyramid,
    ) -> Result<(ScrStructure, String, bool), StageError> {
        let slide_count = outline.len();
        let prompt = prompts::scr(outline, pyramid, &ctx.language);

        for attempt in 1..=SCR_ATTEMPTS {
            ctx.guard()?;
            let request = CompletionRequest::new(prompt.clone()).with_timeout(ctx.scr_timeout);
            // This loop is the retry budget; the client must not add its own.
            let reply = match ctx.generate_once(STAGE, request).await {
                Ok(reply) => reply,
                Err(StageError::Aborted) => return Err(StageError::Aborted),
                Err(error) => {
                    warn!(attempt, %error, "SCR attempt failed");
                    continue;
                }
            };
            match Self::parse_scr(&reply, slide_count) {
                Some((scr, arc)) => {
                    info!(attempt, "SCR structure applied");
                    return Ok((scr, arc, false));
                }
                None => warn!(attempt, "SCR reply unusable"),
            }
        }

        warn!(job_id = %ctx.job_id, "falling back to deterministic SCR partition");
        let scr = ScrStructure::deterministic(slide_count);
        let arc = format!(
            "Situation analysis leads to the core problem, resolved by: {}",
            pyramid.top_message
        );
        Ok((scr, arc, true))
    }

    fn parse_scr(reply: &str, slide_count: usize) -> Option<(ScrStructure, String)> {
        let value = extract_json(reply, ExpectedShape::Object).ok()?;
        let raw: RawScr = serde_json::from_value(value).ok()?;
        let scr = ScrStructure {
            situation_slides: raw.situation_slides,
            complication_slides: raw.complication_slides,
            resolution_slides: raw.resolution_slides,
        };
        scr.validate(slide_count).ok()?;
        Some((scr, raw.story_arc))
    }

    /// Transitions: one batched call for all `N − 1` entries; a short
    /// batch is completed pair-by-pair; total failure is fatal.
    async fn transitions(ctx: &StageContext, outline: &Outline) -> Result<Vec<String>, StageError> {
        let needed = outline.len().saturating_sub(1);
        if needed == 0 {
            return Ok(Vec::new());
        }

        let mut transitions = match Self::transitions_batch(ctx, outline).await {
            Ok(batch) => batch,
            Err(StageError::Aborted) => return Err(StageError::Aborted),
            Err(error) => {
                warn!(%error, "batched transition call failed, switching to per-pair");
                Vec::new()
            }
        };
        transitions.truncate(needed);

        while transitions.len() < needed {
            let index = transitions.len();
            // Entry 0 opens the deck; entry i bridges slide i to i+1.
            let (from, to) = if index == 0 {
                ("the audience's current understanding", outline.slides[0].title.as_str())
            } else {
                (
                    outline.slides[index - 1].title.as_str(),
                    outline.slides[index].title.as_str(),
                )
            };
            let transition = Self::transition_pair(ctx, from, to).await.map_err(|error| {
                match error {
                    StageError::Aborted => StageError::Aborted,
                    other => StageError::Transitions {
                        message: format!("pair {index} failed: {other}"),
                    },
                }
            })?;
            transitions.push(transition);
        }
        Ok(transitions)
    }

    async fn transitions_batch(
        ctx: &StageContext,
        outline: &Outline,
    ) -> Result<Vec<String>, StageError> {
        let prompt = prompts::transitions_batch(outline, &ctx.language);
        let reply = ctx.generate(STAGE, CompletionRequest::new(prompt)).await?;
        let value = extract_json(&reply, ExpectedShape::Array)
            .map_err(|source| StageError::Parse { stage: STAGE, source })?;
        let Value::Array(items) = value else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect())
    }

    async fn transition_pair(
        ctx: &StageContext,
        from: &str,
        to: &str,
    ) -> Result<String, StageError> {
        let prompt = prompts::transition_pair(from, to, &ctx.language);
        let reply = ctx.generate(STAGE, CompletionRequest::new(prompt)).await?;
        let value = extract_json(&reply, ExpectedShape::Object)
            .map_err(|source| StageError::Parse { stage: STAGE, source })?;
        value
            .get("transition")
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| StageError::Transitions {
                message: "pair reply missing transition text".to_string(),
            })
    }

    /// Speaker notes: one batched call, normalized before parsing; a
    /// short batch is completed per slide; total failure is fatal.
    async fn speaker_notes(
        ctx: &StageContext,
        outline: &Outline,
    ) -> Result<Vec<SpeakerNote>, StageError> {
        let needed = outline.len();
        let mut notes = match Self::speaker_notes_batch(ctx, outline).await {
            Ok(notes) => notes,
            Err(StageError::Aborted) => return Err(StageError::Aborted),
            Err(error) => {
                warn!(%error, "batched speaker-note call failed, switching to per-slide");
                Vec::new()
            }
        };
        notes.truncate(needed);

        while notes.len() < needed {
            let slide = &outline.slides[notes.len()];
            let note = Self::speaker_note_single(ctx, &slide.title, &slide.headline)
                .await
                .map_err(|error| match error {
                    StageError::Aborted => StageError::Aborted,
                    other => StageError::SpeakerNotes {
                        message: format!("slide {} failed: {other}", slide.number),
                    },
                })?;
            notes.push(note);
        }
        Ok(notes)
    }

    async fn speaker_notes_batch(
        ctx: &StageContext,
        outline: &Outline,
    ) -> Result<Vec<SpeakerNote>, StageError> {
        let prompt = prompts::speaker_notes_batch(outline, &ctx.language);
        let reply = ctx.generate(STAGE, CompletionRequest::new(prompt)).await?;
        let cleaned = normalize_reply(&reply);
        let value = extract_json(&cleaned, ExpectedShape::Array)
            .map_err(|source| StageError::Parse { stage: STAGE, source })?;
        let Value::Array(items) = value else {
            return Ok(Vec::new());
        };
        Ok(items.into_iter().filter_map(coerce_note).collect())
    }

    async fn speaker_note_single(
        ctx: &StageContext,
        title: &str,
        headline: &str,
    ) -> Result<SpeakerNote, StageError> {
        let prompt = prompts::speaker_note_single(title, headline, &ctx.language);
        let reply = ctx.generate(STAGE, CompletionRequest::new(prompt)).await?;
        let cleaned = normalize_reply(&reply);
        let value = extract_json(&cleaned, ExpectedShape::Object)
            .map_err(|source| StageError::Parse { stage: STAGE, source })?;
        coerce_note(value).ok_or_else(|| StageError::SpeakerNotes {
            message: "single-slide reply unusable".to_string(),
        })
    }
}

/// A note entry may be a structured object or a bare string.
fn coerce_note(value: Value) -> Option<SpeakerNote> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(SpeakerNote::from_text(text)),
        Value::Object(_) => {
            let note: SpeakerNote = serde_json::from_value(value).ok()?;
            (!note.talking_points.is_empty() || !note.emphasis.trim().is_empty()).then_some(note)
        }
        _ => None,
    }
}

/// Formatting normalization applied before parsing: strip control
/// characters (keeping line structure) and drop trailing backslashes that
/// escape nothing.
fn normalize_reply(reply: &str) -> String {
    let mut cleaned: String = reply
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();
    while cleaned.ends_with('\\') {
        cleaned.pop();
    }
    cleaned
}
