//! Error handling module for tourkit
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the engine should use these types for consistency.
//!
//! Most runtime conditions in this crate are deliberately NOT errors:
//! resolution misses, storage failures, and validation rejections degrade
//! gracefully and surface through the diagnostics sink instead. `TourError`
//! covers the loud cases (malformed catalog content, storage plumbing) and
//! the conversions the stores need.

use thiserror::Error;

/// Main error type for the walkthrough engine
#[derive(Error, Debug)]
pub enum TourError {
    /// IO errors (progress file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog content errors (malformed tutorial definitions)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Persistence errors (unreadable/unwritable progress store)
    #[error("Storage error: {0}")]
    Storage(String),

    /// State errors (invalid sequencer state)
    #[error("State error: {0}")]
    State(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General errors (catch-all for edge cases)
    #[error("{0}")]
    General(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, TourError>;

// Convenient error constructors
impl TourError {
    /// Create a catalog content error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a state error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create a general error
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }
}
