//! tourkit — guided walkthrough engine
//!
//! A host-agnostic sequencer for multi-step, multi-tutorial product tours:
//! it walks a user through ordered steps, locates and highlights live UI
//! elements through a narrow [`RenderSurface`] interface, computes overlay
//! placement relative to them, and persists resumable progress with a
//! prerequisite/reward unlock graph.
//!
//! ```
//! use std::sync::Arc;
//! use tourkit::{
//!     BoundingBox, Catalog, MemoryStore, RenderSurface, Sequencer, StepPosition, Transition,
//!     Tutorial, TutorialStep, Viewport,
//! };
//!
//! struct Headless;
//! impl RenderSurface for Headless {
//!     fn find_element(&self, _: &str) -> Option<BoundingBox> { None }
//!     fn scroll_into_view(&self, _: &str) {}
//!     fn viewport(&self) -> Viewport { Viewport::new(1280.0, 800.0) }
//! }
//!
//! let catalog = Catalog::new(vec![Tutorial::new(
//!     "welcome",
//!     "Welcome Tour",
//!     vec![
//!         TutorialStep::new("intro", "Hello", "Welcome aboard!"),
//!         TutorialStep::new("menu", "The menu", "Open it")
//!             .with_target("#main-menu", StepPosition::Bottom),
//!     ],
//! )]);
//!
//! let mut seq = Sequencer::new(catalog, Box::new(MemoryStore::new()), Box::new(Headless));
//! assert_eq!(seq.start("welcome"), Transition::Step(0));
//! assert_eq!(seq.next(), Transition::Step(1));
//! assert!(matches!(seq.next(), Transition::Finished(_)));
//! ```

pub mod catalog;
pub mod diagnostics;
pub mod error;
pub mod layout;
pub mod progress;
pub mod sequencer;
pub mod surface;
pub mod types;
pub mod unlock;

// Re-export main types for convenience
pub use catalog::{
    Catalog, CatalogError, CompleteFn, Rewards, StepHooks, Tutorial, TutorialStep, ValidateFn,
    Validator,
};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticsSink, LogSink};
pub use error::{Result, TourError};
pub use layout::OverlayGeometry;
pub use progress::{
    now_millis, DurableStore, FileStore, MemoryStore, ProgressBook, ProgressMap, TutorialProgress,
};
pub use sequencer::{
    Sequencer, SequencerOptions, SequencerState, StepFrame, Transition, ValidationTicket,
};
pub use surface::{BoundingBox, Point, RenderSurface, Viewport};
pub use types::{ClampMode, Difficulty, SkipPolicy, StepAction, StepPosition};
pub use unlock::{resolve_unlocks, RewardLedger, UnlockOutcome};
