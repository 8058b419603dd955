//! End-to-end scenarios for the pipeline orchestrator, driven by the
//! scripted provider in `common`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use deckweaver::artifacts::{DocumentInput, Language, SlideType, StyledDeck};
use deckweaver::emitter::JsonDeckEmitter;
use deckweaver::pipeline::{CancelHandle, JobStatus, Orchestrator, PipelineConfig};
use deckweaver::progress::{MemoryProgressStore, ProgressSnapshot, ProgressStore, Stage};

use common::{quantified_data_reply, outline_reply, Reply, ScriptedProvider, StrongOutline};

const DOCUMENT: &str = "FY24 revenue grew 20% to 1,200M. Operating margin reached 18%. \
                        Premium mix is now 35% of sales and churn fell to 4.2%.";

struct Harness {
    provider: Arc<ScriptedProvider>,
    store: Arc<MemoryProgressStore>,
    orchestrator: Orchestrator,
    snapshots: flume::Receiver<ProgressSnapshot>,
    _outdir: tempfile::TempDir,
}

fn harness(config: PipelineConfig) -> Harness {
    let provider = ScriptedProvider::new();
    let store = Arc::new(MemoryProgressStore::new());
    let outdir = tempfile::tempdir().unwrap();
    let (tx, rx) = flume::unbounded();
    let orchestrator = Orchestrator::with_config(
        provider.clone(),
        store.clone(),
        Arc::new(JsonDeckEmitter::new(outdir.path())),
        config,
    )
    .with_progress_mirror(tx);
    Harness {
        provider,
        store,
        orchestrator,
        snapshots: rx,
        _outdir: outdir,
    }
}

fn config() -> PipelineConfig {
    PipelineConfig::default().with_language(Language::En)
}

fn input(num_slides: usize) -> DocumentInput {
    DocumentInput::new(DOCUMENT)
        .with_num_slides(num_slides)
        .with_language(Language::En)
        .with_audience("executive board")
        .with_purpose("growth review")
}

fn percents(snapshots: &flume::Receiver<ProgressSnapshot>) -> Vec<(Stage, u8)> {
    snapshots
        .drain()
        .map(|s| (s.current_stage, s.progress))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn happy_path_completes_in_one_iteration() {
    let h = harness(config());
    let response = h.orchestrator.execute("job-s1", input(10)).await;

    assert_eq!(response.status, JobStatus::Completed);
    assert!(response.quality_passed, "score {:.3}", response.quality_score);
    assert!(response.quality_score >= 0.85);
    assert_eq!(response.iterations, 1);
    assert!(response.degraded.is_empty());
    assert!(response.errors.is_empty());

    // Terminal snapshot is durable and at 100.
    let stored = h.store.get("job-s1").await.unwrap().unwrap();
    assert_eq!(stored.current_stage, Stage::Completed);
    assert_eq!(stored.progress, 100);

    // Percent sequence is the nominal ladder, monotonically non-decreasing.
    let seen = percents(&h.snapshots);
    let expected = [
        (Stage::DocumentAnalysis, 20),
        (Stage::DataExtraction, 40),
        (Stage::StructureDesign, 60),
        (Stage::DesignApplication, 80),
        (Stage::QualityReview, 95),
        (Stage::Completed, 100),
    ];
    assert_eq!(seen, expected);

    // The emitted deck honors the outline structure invariants.
    let deck: StyledDeck = serde_json::from_str(
        &std::fs::read_to_string(response.deck_path.unwrap()).unwrap(),
    )
    .unwrap();
    assert_eq!(deck.len(), 10);
    assert_eq!(deck.slides[0].slide_type, SlideType::Title);
    assert_eq!(deck.slides[9].slide_type, SlideType::NextSteps);
    for slide in &deck.slides {
        assert!(!slide.notes.is_empty(), "slide {} has no notes", slide.number);
    }
}

#[tokio::test(start_paused = true)]
async fn observer_feed_streams_snapshots_in_order() {
    use futures_util::StreamExt;

    let provider = ScriptedProvider::new();
    let store = Arc::new(MemoryProgressStore::new());
    let outdir = tempfile::tempdir().unwrap();
    let (tx, mut stream) = deckweaver::progress::observer_feed();
    let orchestrator = Orchestrator::with_config(
        provider,
        store,
        Arc::new(JsonDeckEmitter::new(outdir.path())),
        config(),
    )
    .with_progress_mirror(tx);

    orchestrator.execute("job-feed", input(10)).await;

    let mut last = 0u8;
    let mut terminal = None;
    while let Some(snapshot) = stream.next().await {
        assert!(snapshot.progress >= last);
        last = snapshot.progress;
        if snapshot.current_stage.is_terminal() {
            terminal = Some(snapshot.current_stage);
            break;
        }
    }
    assert_eq!(terminal, Some(Stage::Completed));
}

#[tokio::test(start_paused = true)]
async fn structure_preview_is_published_with_structure_design() {
    let h = harness(config());
    h.orchestrator.execute("job-preview", input(15)).await;
    let snapshots: Vec<ProgressSnapshot> = h.snapshots.drain().collect();
    let design = snapshots
        .iter()
        .find(|s| s.current_stage == Stage::StructureDesign)
        .expect("structure_design snapshot");
    assert!(!design.structure_preview.is_empty());
    assert!(design.structure_preview.len() <= ProgressSnapshot::MAX_PREVIEW);
    assert_eq!(design.structure_preview[0].slide, 1);
    assert!(!design.structure_preview[0].layout.is_empty());
}

#[tokio::test(start_paused = true)]
async fn analyst_falls_back_on_prose_only_documents() {
    let h = harness(config());
    // The extractor finds nothing usable in the reply.
    h.provider
        .always("data", Reply::Text("I could not find quantitative data.".into()));
    let prose = DocumentInput::new("The team feels momentum is building across the region.")
        .with_num_slides(8)
        .with_language(Language::En);

    let response = h.orchestrator.execute("job-s2", prose).await;

    assert_eq!(response.status, JobStatus::Completed);
    assert!(response
        .degraded
        .iter()
        .any(|r| r == deckweaver::stages::analyst::FALLBACK_REASON));
    let stored = h.store.get("job-s2").await.unwrap().unwrap();
    assert_eq!(stored.current_stage, Stage::Completed);
}

#[tokio::test(start_paused = true)]
async fn clarity_hints_trigger_analyst_replay() {
    // A higher bar plus number-free headlines: the first review flags
    // clarity as the only high-priority weakness.
    let h = harness(config().with_target_quality(0.9));
    h.provider.always(
        "outline",
        Reply::Text(outline_reply(10, StrongOutline::weak_headlines())),
    );
    // First analyst pass yields unquantified metric names; the replayed
    // pass carries numbers the designer can splice into headlines.
    h.provider
        .push("data", Reply::Text(common::default_reply("data", "")));
    h.provider
        .push("data", Reply::Text(quantified_data_reply()));

    let response = h.orchestrator.execute("job-s3", input(10)).await;

    assert_eq!(response.status, JobStatus::Completed);
    assert_eq!(response.iterations, 2);
    assert!(response.quality_passed, "score {:.3}", response.quality_score);
    assert!(response.iterations <= 3);

    // Analyst replayed; strategist and storyteller were reused verbatim.
    assert_eq!(h.provider.calls("data"), 2);
    assert_eq!(h.provider.calls("outline"), 1);
    assert_eq!(h.provider.calls("analysis"), 1);
    assert_eq!(h.provider.calls("scr"), 1);
    assert_eq!(h.provider.calls("transitions"), 1);
    assert_eq!(h.provider.calls("notes"), 1);
}

#[tokio::test(start_paused = true)]
async fn iteration_budget_is_bounded() {
    // Headlines never become quantified: clarity stays weak, and the
    // job finalizes below target once the budget is spent.
    let h = harness(config().with_target_quality(0.99).with_max_iterations(3));
    h.provider.always(
        "outline",
        Reply::Text(outline_reply(10, StrongOutline::weak_headlines())),
    );

    let response = h.orchestrator.execute("job-budget", input(10)).await;

    assert_eq!(response.status, JobStatus::Completed);
    assert!(!response.quality_passed);
    assert_eq!(response.iterations, 3);
    let stored = h.store.get("job-budget").await.unwrap().unwrap();
    assert_eq!(stored.current_stage, Stage::Completed);
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_at_the_next_boundary() {
    let h = harness(config());
    let cancel = CancelHandle::new();
    h.provider.set_cancel(cancel.clone());
    // The observer cancels while the analyst's extraction call is in
    // flight; the reply completes but is discarded.
    h.provider.always("data", Reply::CancelJob);

    let response = h
        .orchestrator
        .execute_cancellable("job-s4", input(10), cancel)
        .await;

    assert_eq!(response.status, JobStatus::Failed);
    assert_eq!(response.errors, vec!["aborted".to_string()]);
    assert!(response.deck_path.is_none());

    // No progress events after the abort was observed: the last durable
    // snapshot is data_extraction at 40, not a terminal one.
    let seen = percents(&h.snapshots);
    assert_eq!(
        seen.last().copied(),
        Some((Stage::DataExtraction, 40))
    );
    let stored = h.store.get("job-s4").await.unwrap().unwrap();
    assert_eq!(stored.current_stage, Stage::DataExtraction);
}

#[tokio::test(start_paused = true)]
async fn mece_violation_is_fatal_before_any_downstream_work() {
    let h = harness(config());
    // Two arguments where the CUSTOM framework declares three.
    h.provider.always(
        "pyramid",
        Reply::Text(
            json!({
                "top_message": "Act now",
                "supporting_arguments": [
                    {"category": "Current State", "argument": "a", "evidence": ["e1", "e2"]},
                    {"category": "Key Challenges", "argument": "b", "evidence": ["e1", "e2"]}
                ]
            })
            .to_string(),
        ),
    );

    let response = h.orchestrator.execute("job-s5", input(10)).await;

    assert_eq!(response.status, JobStatus::Failed);
    assert!(response.errors[0].contains("MECE"));
    assert!(response.deck_path.is_none());
    // The analyst (and everything after it) never ran.
    assert_eq!(h.provider.calls("data"), 0);
    assert_eq!(h.provider.calls("scr"), 0);

    let stored = h.store.get("job-s5").await.unwrap().unwrap();
    assert_eq!(stored.current_stage, Stage::Failed);
}

#[tokio::test(start_paused = true)]
async fn scr_timeout_degrades_to_deterministic_partition() {
    let h = harness(config());
    h.provider.always("scr", Reply::Hang);

    let response = h.orchestrator.execute("job-s6", input(12)).await;

    assert_eq!(response.status, JobStatus::Completed);
    assert!(response
        .degraded
        .iter()
        .any(|r| r == deckweaver::stages::storyteller::SCR_FALLBACK_REASON));
    // Transitions and speaker notes were still produced normally.
    assert_eq!(h.provider.calls("transitions"), 1);
    assert_eq!(h.provider.calls("notes"), 1);
    // This degradation alone does not sink the quality verdict.
    assert!(response.quality_passed);
}

#[tokio::test(start_paused = true)]
async fn job_deadline_aborts_remaining_work() {
    let h = harness(config().with_job_timeout(Duration::from_secs(2)));
    h.provider.always("analysis", Reply::Hang);

    let response = h.orchestrator.execute("job-deadline", input(10)).await;

    assert_eq!(response.status, JobStatus::Failed);
    assert!(response.errors[0].contains("deadline"));
    let stored = h.store.get("job-deadline").await.unwrap().unwrap();
    assert_eq!(stored.current_stage, Stage::Failed);
}

#[tokio::test(start_paused = true)]
async fn fatal_provider_errors_fail_the_job() {
    let h = harness(config());
    h.provider.always("analysis", Reply::Fatal);

    let response = h.orchestrator.execute("job-auth", input(10)).await;

    assert_eq!(response.status, JobStatus::Failed);
    assert!(!response.errors.is_empty());
    let stored = h.store.get("job-auth").await.unwrap().unwrap();
    assert_eq!(stored.current_stage, Stage::Failed);
}

#[tokio::test(start_paused = true)]
async fn invalid_input_fails_without_running_stages() {
    let h = harness(config());
    let response = h
        .orchestrator
        .execute("job-empty", DocumentInput::new("  "))
        .await;

    assert_eq!(response.status, JobStatus::Failed);
    assert_eq!(h.provider.calls("analysis"), 0);
    let stored = h.store.get("job-empty").await.unwrap().unwrap();
    assert_eq!(stored.current_stage, Stage::Failed);
}

#[tokio::test(start_paused = true)]
async fn blank_job_ids_are_replaced_with_generated_ones() {
    let h = harness(config());
    let response = h.orchestrator.execute("   ", input(10)).await;
    assert_eq!(response.status, JobStatus::Completed);
    assert!(!response.job_id.trim().is_empty());
    assert!(h.store.get(&response.job_id).await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn concurrent_jobs_are_isolated() {
    let h = harness(config());
    let o = &h.orchestrator;
    let (a, b) = tokio::join!(
        o.execute("job-a", input(8)),
        o.execute("job-b", input(12)),
    );
    assert_eq!(a.status, JobStatus::Completed);
    assert_eq!(b.status, JobStatus::Completed);
    assert_ne!(a.deck_path, b.deck_path);
    assert_eq!(
        h.store.get("job-a").await.unwrap().unwrap().current_stage,
        Stage::Completed
    );
    assert_eq!(
        h.store.get("job-b").await.unwrap().unwrap().current_stage,
        Stage::Completed
    );
}
