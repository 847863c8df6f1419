//! Diagnostics sink for non-fatal engine events
//!
//! Nothing in this crate throws during normal operation; recoverable
//! degradations (missing targets, unreadable progress, rejected
//! validations) are reported here so the composing application can detect
//! broken tours without the tour itself ever blocking or crashing.

use std::fmt;
use std::sync::Mutex;

/// A non-fatal event worth surfacing to telemetry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A step's target identifier matched no live element
    TargetNotFound {
        tutorial: String,
        step: String,
        target: String,
    },
    /// Persisted progress was unreadable; the engine reset to an empty map
    ProgressCorrupted { detail: String },
    /// Progress could not be written; the session continues in memory only
    StoreUnavailable { detail: String },
    /// A step validation callback returned an error (treated as "not yet")
    ValidationFailed {
        tutorial: String,
        step: String,
        detail: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotFound {
                tutorial,
                step,
                target,
            } => write!(
                f,
                "target '{}' not found for step '{}' of tutorial '{}'",
                target, step, tutorial
            ),
            Self::ProgressCorrupted { detail } => {
                write!(f, "stored progress unreadable, starting empty: {}", detail)
            }
            Self::StoreUnavailable { detail } => {
                write!(f, "progress store unwritable, running in-memory: {}", detail)
            }
            Self::ValidationFailed {
                tutorial,
                step,
                detail,
            } => write!(
                f,
                "validation errored for step '{}' of tutorial '{}': {}",
                step, tutorial, detail
            ),
        }
    }
}

/// Receiver for non-fatal engine events
pub trait DiagnosticsSink {
    fn emit(&self, event: &Diagnostic);
}

/// Default sink: forwards every event to `tracing` at warn level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn emit(&self, event: &Diagnostic) {
        tracing::warn!("{}", event);
    }
}

/// Test/inspection sink that records every event it receives
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events emitted so far
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.lock().expect("sink lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("sink lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticsSink for CollectingSink {
    fn emit(&self, event: &Diagnostic) {
        self.events.lock().expect("sink lock poisoned").push(event.clone());
    }
}
