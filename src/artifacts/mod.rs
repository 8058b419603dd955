//! Typed artifacts flowing through the deck pipeline.
//!
//! Every value produced by one stage and consumed by later stages lives
//! here. Artifacts are immutable after creation: stages receive references
//! (or cheap clones) and return fresh values. The orchestrator owns the
//! set of artifacts belonging to one job and discards stale downstream
//! artifacts when an upstream stage is replayed.
//!
//! # Artifact flow
//!
//! ```text
//! DocumentInput ─▶ Analysis ─▶ Framework ─▶ Pyramid ─▶ Outline
//!                                                        │
//!                    DataPoint ─▶ Insight ─▶ ChartSpec ◀─┘
//!                                                        │
//!                              Narrative ◀───────────────┤
//!                                                        ▼
//!                                                   StyledDeck
//! ```
//!
//! Closed sets (slide types, layout tags, chart types, frameworks) are
//! enumerated; optional data is explicit `Option`; free-form maps use
//! [`rustc_hash::FxHashMap`].

pub mod analysis;
pub mod data;
pub mod deck;
pub mod document;
pub mod framework;
pub mod insight;
pub mod narrative;
pub mod outline;
pub mod pyramid;
pub mod visualization;

pub use analysis::Analysis;
pub use data::{Comparison, DataPoint};
pub use deck::{LayoutHints, Region, SlideBody, StyledDeck, StyledSlide, ThemeProfile};
pub use document::{DocumentInput, InputError, Language};
pub use framework::{Framework, FrameworkKind};
pub use insight::{Insight, InsightKind};
pub use narrative::{Narrative, ScrStructure, SpeakerNote};
pub use outline::{ContentType, LayoutType, Outline, SlideSpec, SlideType};
pub use pyramid::{Pyramid, SupportingArgument};
pub use visualization::{ChartSpec, ChartType};
