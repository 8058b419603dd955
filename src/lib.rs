//! # Deckweaver: Staged Agent Pipeline for Slide Decks
//!
//! Deckweaver turns a business document into a consulting-grade slide
//! deck model through five specialist stages (strategist, analyst,
//! storyteller, designer, reviewer) with iterative quality-driven
//! refinement.
//!
//! ## Core Concepts
//!
//! - **Artifacts**: Immutable typed values passed between stages
//! - **Stages**: Stateless async units returning `Ok | Degraded | Fatal`
//! - **Progress**: Stage/percent snapshots published for observers
//! - **Quality**: Weighted five-criterion rubric driving partial re-runs
//! - **Orchestrator**: Stage ordering, deadlines, cancellation, iteration
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use deckweaver::artifacts::{DocumentInput, Language};
//! use deckweaver::emitter::JsonDeckEmitter;
//! use deckweaver::pipeline::Orchestrator;
//! use deckweaver::progress::{MemoryProgressStore, ProgressStore};
//!
//! # async fn example(provider: Arc<dyn deckweaver::llm::CompletionProvider>) {
//! let store = Arc::new(MemoryProgressStore::new());
//! let orchestrator = Orchestrator::new(
//!     provider,                                  // your LLM backend
//!     store.clone(),                             // progress for observers
//!     Arc::new(JsonDeckEmitter::new("output")),  // deck file emitter
//! );
//!
//! let input = DocumentInput::new("FY24 revenue grew 12% to 1.2B …")
//!     .with_num_slides(12)
//!     .with_language(Language::En)
//!     .with_purpose("investment review");
//!
//! let response = orchestrator.execute("job-42", input).await;
//! println!("score {:.2} after {} pass(es)", response.quality_score, response.iterations);
//!
//! // Observers poll the store independently:
//! let snapshot = store.get("job-42").await.unwrap();
//! # let _ = snapshot;
//! # }
//! ```
//!
//! ## Failure Policy
//!
//! Stages report through a sum type, never exceptions-as-control-flow:
//! strategist failures are fatal (nothing downstream can run), analyst
//! extraction failures degrade to deterministic fallback data (flagged,
//! never silent), the storyteller's SCR step falls back to a fixed
//! partition while its transitions and speaker notes fail hard, and a
//! deck that never reaches the quality target finalizes with
//! `quality_passed = false` once the iteration budget is spent.
//!
//! ## Module Guide
//!
//! - [`artifacts`] - Typed values flowing through the pipeline
//! - [`llm`] - Completion-provider boundary, retries, JSON extraction
//! - [`progress`] - Snapshot store and monotonic publisher
//! - [`stages`] - The five specialist agents and the insight ladder
//! - [`quality`] - So-What tester, visual validator, weighted rubric
//! - [`pipeline`] - Configuration, cancellation, the orchestrator
//! - [`emitter`] - Deck-file emitter boundary
//! - [`prompts`] - Language-aware prompt builders
//! - [`telemetry`] - Tracing setup helper

pub mod artifacts;
pub mod emitter;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod quality;
pub mod stages;
pub mod telemetry;
