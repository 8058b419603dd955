//! Strategist: document analysis, framework selection, pyramid, outline.
//!
//! The strategist is the only stage whose parse failures are fatal:
//! nothing downstream can run without its output, so there is no
//! deterministic fallback to degrade to.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::artifacts::{
    outline, Analysis, ContentType, DocumentInput, Framework, LayoutType, Outline, Pyramid,
    SlideSpec, SlideType,
};
use crate::llm::{extract_json, CompletionRequest, ExpectedShape};
use crate::prompts;

use super::{StageContext, StageError, StageOutcome};

const STAGE: &str = "strategist";

/// Everything the strategist hands downstream.
#[derive(Clone, Debug)]
pub struct StrategistOutput {
    pub analysis: Analysis,
    pub framework: Framework,
    pub pyramid: Pyramid,
    pub outline: Outline,
}

/// Slide object as the LLM tends to return it: tags may be missing or
/// unusable, and are back-filled deterministically.
#[derive(Debug, Deserialize)]
struct RawSlide {
    #[serde(default)]
    number: usize,
    #[serde(default)]
    slide_type: Option<SlideType>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    content_type: Option<ContentType>,
    #[serde(default)]
    layout_type: Option<LayoutType>,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    mece_segment: Option<String>,
}

pub struct Strategist;

impl Strategist {
    /// Run all four sub-steps sequentially.
    pub async fn run(ctx: &StageContext, input: &DocumentInput) -> StageOutcome<StrategistOutput> {
        match Self::run_inner(ctx, input).await {
            Ok(output) => StageOutcome::Ok(output),
            Err(error) => StageOutcome::Fatal(error),
        }
    }

    async fn run_inner(
        ctx: &StageContext,
        input: &DocumentInput,
    ) -> Result<StrategistOutput, StageError> {
        let analysis = Self::analyze(ctx, input).await?;
        info!(job_id = %ctx.job_id, key_message = %analysis.key_message, "document analyzed");

        let framework = Framework::select(&analysis);
        debug!(framework = %framework.name, "framework selected");

        let pyramid = Self::build_pyramid(ctx, &analysis, &framework).await?;
        let outline = Self::build_outline(ctx, &pyramid, &framework, input.num_slides).await?;

        Ok(StrategistOutput {
            analysis,
            framework,
            pyramid,
            outline,
        })
    }

    async fn analyze(ctx: &StageContext, input: &DocumentInput) -> Result<Analysis, StageError> {
        let reply = ctx
            .generate(STAGE, CompletionRequest::new(prompts::analysis(input)))
            .await?;
        let value = extract_json(&reply, ExpectedShape::Object)
            .map_err(|source| StageError::Parse { stage: STAGE, source })?;
        serde_json::from_value(value).map_err(|err| StageError::Parse {
            stage: STAGE,
            source: crate::llm::ParseError::Invalid {
                reason: err.to_string(),
                offset: 0,
            },
        })
    }

    async fn build_pyramid(
        ctx: &StageContext,
        analysis: &Analysis,
        framework: &Framework,
    ) -> Result<Pyramid, StageError> {
        let prompt = prompts::pyramid(analysis, framework, &ctx.language);
        let reply = ctx.generate(STAGE, CompletionRequest::new(prompt)).await?;
        let value = extract_json(&reply, ExpectedShape::Object)
            .map_err(|source| StageError::Parse { stage: STAGE, source })?;
        let pyramid: Pyramid = serde_json::from_value(value).map_err(|err| StageError::Parse {
            stage: STAGE,
            source: crate::llm::ParseError::Invalid {
                reason: err.to_string(),
                offset: 0,
            },
        })?;
        pyramid
            .validate_against(framework)
            .map_err(|violation| StageError::MeceViolation {
                details: violation.to_string(),
            })?;
        Ok(pyramid)
    }

    async fn build_outline(
        ctx: &StageContext,
        pyramid: &Pyramid,
        framework: &Framework,
        num_slides: usize,
    ) -> Result<Outline, StageError> {
        let prompt = prompts::outline(pyramid, framework, num_slides, &ctx.language);
        let reply = ctx.generate(STAGE, CompletionRequest::new(prompt)).await?;
        let value = extract_json(&reply, ExpectedShape::Array)
            .map_err(|source| StageError::Parse { stage: STAGE, source })?;
        let raw: Vec<RawSlide> = match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        };

        let mut outline = Outline::new(
            raw.into_iter()
                .enumerate()
                .map(|(idx, slide)| Self::finish_slide(idx, slide))
                .collect(),
        );
        outline.normalize(framework);
        outline
            .validate(num_slides, framework)
            .map_err(|violation| StageError::OutlineInvalid {
                details: violation.to_string(),
            })?;
        Ok(outline)
    }

    /// Turn a raw slide into a full spec, back-filling missing tags with
    /// the keyword heuristic.
    fn finish_slide(idx: usize, raw: RawSlide) -> SlideSpec {
        let number = if raw.number > 0 { raw.number } else { idx + 1 };
        let (inferred_content, inferred_layout) = outline::classify(number, &raw.title);
        SlideSpec {
            number,
            slide_type: raw.slide_type.unwrap_or(SlideType::Content),
            title: raw.title,
            headline: raw.headline,
            content_type: raw.content_type.unwrap_or(inferred_content),
            layout_type: raw.layout_type.unwrap_or(inferred_layout),
            key_points: raw.key_points,
            mece_segment: raw.mece_segment,
        }
    }
}
