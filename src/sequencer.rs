//! Step sequencer state machine
//!
//! The orchestrator: owns which tutorial/step is active, applies the
//! transitions (`start`, `resume`, `next`, `previous`, `skip`, `close`),
//! drives target resolution and overlay placement for the active step, and
//! is the only writer of the progress book.
//!
//! # Design Principles
//!
//! - **Single Source of Truth**: the `Sequencer` owns the active state;
//!   callers read it, never mutate it directly
//! - **No Global State**: catalog, store, surface, and sink are injected
//!   and owned, never ambient
//! - **Defensively Idempotent**: edge calls (`previous` at the first step,
//!   any transition while idle, stale validation results) are silent
//!   no-ops, never errors
//!
//! # Rapid-fire and async safety
//!
//! Every applied transition bumps an internal generation counter.
//! Deferred (host-driven, possibly asynchronous) validations receive a
//! [`ValidationTicket`] stamped with the generation and step they were
//! issued against; a ticket whose stamp no longer matches is discarded, so
//! a validation that resolves after `close()` or `start()` can never apply
//! a stale transition. While a ticket is outstanding, `next()` and
//! `skip()` are held, which also absorbs double-pressed "Next" buttons.

use std::sync::Arc;

use crate::catalog::{Catalog, Tutorial, TutorialStep, Validator};
use crate::diagnostics::{Diagnostic, DiagnosticsSink, LogSink};
use crate::layout::OverlayGeometry;
use crate::progress::{now_millis, DurableStore, ProgressBook, TutorialProgress};
use crate::surface::{BoundingBox, Point, RenderSurface};
use crate::types::{SkipPolicy, StepPosition};
use crate::unlock::{resolve_unlocks, RewardLedger, UnlockOutcome};

/// Where the sequencer currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerState {
    /// No active tutorial
    Idle,
    /// Walking `tutorial_id`, showing the 0-based `step`
    Active { tutorial_id: String, step: usize },
}

impl SequencerState {
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// `(tutorial id, step index)` when a tutorial is active
    pub fn active(&self) -> Option<(&str, usize)> {
        match self {
            Self::Idle => None,
            Self::Active { tutorial_id, step } => Some((tutorial_id, *step)),
        }
    }
}

/// Result of a transition request
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Entered the given step of the active tutorial
    Step(usize),
    /// The active tutorial completed; the sequencer is idle again
    Finished(UnlockOutcome),
    /// The current step's completion condition does not hold yet, or a
    /// deferred validation is still outstanding
    Held,
    /// The call had no effect
    Ignored,
}

/// Everything the host needs to render the active step
#[derive(Debug, Clone, PartialEq)]
pub struct StepFrame {
    pub tutorial_id: String,
    pub step_index: usize,
    /// Top-left corner of the overlay panel
    pub anchor: Point,
    /// Spotlight rectangle, absent when the step has no resolved target.
    /// Drawn above normal content, below the overlay panel.
    pub spotlight: Option<BoundingBox>,
}

/// Engine behavior knobs
#[derive(Debug, Clone, Copy, Default)]
pub struct SequencerOptions {
    pub skip_policy: SkipPolicy,
    pub geometry: OverlayGeometry,
}

/// Handle for a host-driven (deferred) validation in flight.
///
/// Stamped with the generation and step it was issued against; redeeming
/// it after any intervening transition is a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationTicket {
    generation: u64,
    step: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingValidation {
    generation: u64,
    step: usize,
}

/// The step sequencer
pub struct Sequencer {
    catalog: Catalog,
    surface: Box<dyn RenderSurface>,
    book: ProgressBook,
    sink: Arc<dyn DiagnosticsSink>,
    options: SequencerOptions,
    state: SequencerState,
    frame: Option<StepFrame>,
    ledger: RewardLedger,
    generation: u64,
    pending: Option<PendingValidation>,
}

impl Sequencer {
    /// Create a sequencer with default options and tracing-backed
    /// diagnostics
    pub fn new(
        catalog: Catalog,
        store: Box<dyn DurableStore>,
        surface: Box<dyn RenderSurface>,
    ) -> Self {
        Self::with_config(
            catalog,
            store,
            surface,
            Arc::new(LogSink),
            SequencerOptions::default(),
        )
    }

    /// Create a sequencer with an explicit diagnostics sink and options
    pub fn with_config(
        catalog: Catalog,
        store: Box<dyn DurableStore>,
        surface: Box<dyn RenderSurface>,
        sink: Arc<dyn DiagnosticsSink>,
        options: SequencerOptions,
    ) -> Self {
        let book = ProgressBook::open(store, sink.clone());
        // Points and badges survive reloads by replaying the persisted
        // completed set, no separate reward persistence needed.
        let ledger = RewardLedger::replay(&catalog, &book.completed_set());
        Self {
            catalog,
            surface,
            book,
            sink,
            options,
            state: SequencerState::Idle,
            frame: None,
            ledger,
            generation: 0,
            pending: None,
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    #[inline]
    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    /// Render data for the active step, if any
    pub fn active_frame(&self) -> Option<&StepFrame> {
        self.frame.as_ref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn progress(&self) -> &ProgressBook {
        &self.book
    }

    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    /// Tutorials whose prerequisites are satisfied by current progress
    /// (display-level gating only; `start` does not enforce it)
    pub fn available(&self) -> Vec<&Tutorial> {
        self.catalog.available(&self.book.completed_set())
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Start `tutorial_id` from its first step, overwriting any prior
    /// progress record for it.
    ///
    /// Only ids the catalog rejected (or never knew) are refused, with a
    /// warning; prerequisite gating is the composing application's job.
    pub fn start(&mut self, tutorial_id: &str) -> Transition {
        if !self.catalog.contains(tutorial_id) {
            tracing::warn!("start: tutorial '{}' is not startable", tutorial_id);
            return Transition::Ignored;
        }

        self.bump();
        self.book.record(TutorialProgress::start(tutorial_id));
        self.state = SequencerState::Active {
            tutorial_id: tutorial_id.to_string(),
            step: 0,
        };
        tracing::debug!("start: '{}' at step 0", tutorial_id);
        self.enter_step(true);
        Transition::Step(0)
    }

    /// Re-enter a previously started, not yet completed tutorial at its
    /// persisted step. Silently ignored when no such progress exists.
    pub fn resume(&mut self, tutorial_id: &str) -> Transition {
        let Some(tutorial) = self.catalog.get(tutorial_id) else {
            return Transition::Ignored;
        };
        let step_count = tutorial.steps.len();
        let Some(progress) = self.book.get(tutorial_id) else {
            return Transition::Ignored;
        };
        if progress.completed {
            return Transition::Ignored;
        }
        // A shrunk catalog entry could leave a stored index past the end;
        // clamp instead of rejecting the resume.
        let step = progress.current_step.min(step_count - 1);

        self.bump();
        self.state = SequencerState::Active {
            tutorial_id: tutorial_id.to_string(),
            step,
        };
        tracing::debug!("resume: '{}' at step {}", tutorial_id, step);
        self.enter_step(true);
        Transition::Step(step)
    }

    /// Advance past the current step.
    ///
    /// Runs the step's validation first: an unmet condition (or a deferred
    /// validation still outstanding) holds the step. Advancing past the
    /// final step completes the tutorial, resolves unlocks exactly once,
    /// and returns to idle.
    pub fn next(&mut self) -> Transition {
        let Some((tutorial_id, step_index)) = self.state.active() else {
            return Transition::Ignored;
        };
        if self.pending.is_some() {
            return Transition::Held;
        }
        let tutorial_id = tutorial_id.to_string();
        let step = self.current_step_cloned();

        match &step.hooks.validation {
            None => {}
            Some(Validator::Deferred) => return Transition::Held,
            Some(Validator::Sync(check)) => match check(&step) {
                Ok(true) => {}
                Ok(false) => return Transition::Held,
                Err(detail) => {
                    self.sink.emit(&Diagnostic::ValidationFailed {
                        tutorial: tutorial_id,
                        step: step.id.clone(),
                        detail,
                    });
                    return Transition::Held;
                }
            },
        }

        if let Some(hook) = &step.hooks.on_complete {
            hook(&step);
        }
        self.advance_from(step_index)
    }

    /// Step back to the previous step. No-op at the first step or while
    /// idle.
    pub fn previous(&mut self) -> Transition {
        let Some((tutorial_id, step_index)) = self.state.active() else {
            return Transition::Ignored;
        };
        if step_index == 0 {
            return Transition::Ignored;
        }
        let tutorial_id = tutorial_id.to_string();
        let step = step_index - 1;

        self.bump();
        self.book.update(&tutorial_id, |p| p.current_step = step);
        self.state = SequencerState::Active {
            tutorial_id,
            step,
        };
        self.enter_step(true);
        Transition::Step(step)
    }

    /// Record the current step as skipped and advance.
    ///
    /// Under `SkipPolicy::Always` this works even on
    /// steps that are not optional; `SkipPolicy::OptionalOnly` makes it a
    /// no-op there. Skipping bypasses validation and `on_complete`.
    pub fn skip(&mut self) -> Transition {
        let Some((tutorial_id, step_index)) = self.state.active() else {
            return Transition::Ignored;
        };
        if self.pending.is_some() {
            return Transition::Held;
        }
        let tutorial_id = tutorial_id.to_string();
        let step = self.current_step_cloned();

        if !step.optional && self.options.skip_policy == SkipPolicy::OptionalOnly {
            return Transition::Ignored;
        }

        let step_id = step.id;
        self.book.update(&tutorial_id, |p| {
            p.skipped_steps.insert(step_id);
        });
        self.advance_from(step_index)
    }

    /// Leave the active tutorial without touching its progress, releasing
    /// the highlight and discarding any validation in flight. A later
    /// `resume` re-enters at the same step. Returns whether a tutorial was
    /// actually closed.
    pub fn close(&mut self) -> bool {
        if self.state.is_idle() {
            return false;
        }
        self.bump();
        self.state = SequencerState::Idle;
        self.frame = None;
        true
    }

    // =========================================================================
    // Deferred validation
    // =========================================================================

    /// Begin a host-driven validation of the current step.
    ///
    /// Only steps with a deferred validator hand out tickets, and only one
    /// ticket may be outstanding at a time. While it is, `next()` and
    /// `skip()` are held (hosts should show a pending/disabled state).
    pub fn begin_validation(&mut self) -> Option<ValidationTicket> {
        let (_, step_index) = self.state.active()?;
        if self.pending.is_some() {
            return None;
        }
        let step = self.current_step_cloned();
        if !matches!(step.hooks.validation, Some(Validator::Deferred)) {
            return None;
        }
        let ticket = ValidationTicket {
            generation: self.generation,
            step: step_index,
        };
        self.pending = Some(PendingValidation {
            generation: ticket.generation,
            step: ticket.step,
        });
        Some(ticket)
    }

    /// Deliver the result of a deferred validation.
    ///
    /// A stale ticket (any intervening `start`/`close`/transition) is
    /// discarded without effect. `passed = false` holds the step; the
    /// host's validation errors should be delivered as `false`.
    pub fn finish_validation(&mut self, ticket: ValidationTicket, passed: bool) -> Transition {
        let matches_pending = self
            .pending
            .map(|p| p.generation == ticket.generation && p.step == ticket.step)
            .unwrap_or(false);
        if matches_pending {
            self.pending = None;
        }
        if ticket.generation != self.generation {
            return Transition::Ignored;
        }
        let Some((_, step_index)) = self.state.active() else {
            return Transition::Ignored;
        };
        if !matches_pending || step_index != ticket.step {
            return Transition::Ignored;
        }
        if !passed {
            return Transition::Held;
        }

        let step = self.current_step_cloned();
        if let Some(hook) = &step.hooks.on_complete {
            hook(&step);
        }
        self.advance_from(step_index)
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Recompute the active frame from current state (viewport resize or
    /// scroll). Idempotent; does not re-scroll the target or re-emit
    /// resolution diagnostics.
    pub fn refresh(&mut self) -> Option<&StepFrame> {
        if self.state.is_idle() {
            return None;
        }
        self.enter_step(false);
        self.frame.as_ref()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Invalidate any outstanding ticket and mark a state change
    fn bump(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    /// Clone of the active step (hooks are `Arc`s, so this is cheap).
    ///
    /// Must only be called while `Active`; the state invariant keeps the
    /// index in bounds.
    fn current_step_cloned(&self) -> TutorialStep {
        let (tutorial_id, step) = self
            .state
            .active()
            .expect("current_step_cloned called while idle");
        self.catalog
            .get(tutorial_id)
            .expect("active tutorial missing from catalog")
            .steps[step]
            .clone()
    }

    /// Apply the shared advance semantics of `next`/`skip`
    fn advance_from(&mut self, step_index: usize) -> Transition {
        let (tutorial_id, _) = self.state.active().expect("advance while idle");
        let tutorial_id = tutorial_id.to_string();
        let step_count = self
            .catalog
            .get(&tutorial_id)
            .expect("active tutorial missing from catalog")
            .steps
            .len();

        self.bump();
        let next_index = step_index + 1;

        if next_index < step_count {
            self.book
                .update(&tutorial_id, |p| p.current_step = next_index);
            self.state = SequencerState::Active {
                tutorial_id: tutorial_id.clone(),
                step: next_index,
            };
            tracing::debug!("advance: '{}' to step {}", tutorial_id, next_index);
            self.enter_step(true);
            return Transition::Step(next_index);
        }

        // Past the last step: finalize and resolve unlocks.
        let completed_before = self.book.completed_set();
        self.book.update(&tutorial_id, |p| {
            p.current_step = next_index;
            if !p.completed {
                p.completed = true;
                p.completed_at = Some(now_millis());
            }
        });

        let tutorial = self
            .catalog
            .get(&tutorial_id)
            .expect("active tutorial missing from catalog");
        let outcome = resolve_unlocks(&self.catalog, &completed_before, tutorial, &mut self.ledger);
        tracing::debug!(
            "completed '{}': +{} points, {} newly available",
            tutorial_id,
            outcome.points_awarded,
            outcome.newly_available.len()
        );

        self.state = SequencerState::Idle;
        self.frame = None;
        Transition::Finished(outcome)
    }

    /// Resolve the active step's target and compute its frame.
    ///
    /// `announce` is set on step entry: the target is scrolled into view
    /// and a resolution miss emits one diagnostic. Refreshes pass false.
    fn enter_step(&mut self, announce: bool) {
        let Some((tutorial_id, step_index)) = self.state.active() else {
            return;
        };
        let tutorial_id = tutorial_id.to_string();
        let step = self.current_step_cloned();
        let viewport = self.surface.viewport();

        let resolved = match &step.target {
            None => None,
            Some(target) => match self.surface.find_element(target) {
                Some(bounds) => {
                    if announce {
                        self.surface.scroll_into_view(target);
                    }
                    Some(bounds)
                }
                None => {
                    if announce {
                        self.sink.emit(&Diagnostic::TargetNotFound {
                            tutorial: tutorial_id.clone(),
                            step: step.id.clone(),
                            target: target.clone(),
                        });
                    }
                    None
                }
            },
        };

        let geometry = &self.options.geometry;
        let position = if resolved.is_some() {
            step.position
        } else {
            StepPosition::Center
        };
        let anchor = geometry.anchor(position, resolved.as_ref(), viewport);
        let spotlight = resolved.as_ref().map(|b| geometry.spotlight(b));

        self.frame = Some(StepFrame {
            tutorial_id,
            step_index,
            anchor,
            spotlight,
        });
    }
}
