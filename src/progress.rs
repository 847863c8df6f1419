//! Durable tutorial progress
//!
//! One [`TutorialProgress`] record per tutorial id, owned by a
//! [`ProgressBook`] that loads once at engine startup and re-saves on every
//! mutation. The book is an explicitly owned instance passed into the
//! sequencer, never an ambient singleton, so tests can inject a
//! [`MemoryStore`].
//!
//! Failure posture: unreadable stored data degrades to an empty map, an
//! unwritable store flips the session into memory-only mode. Both paths
//! emit a diagnostic and neither ever crashes the engine.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::error::Result;

/// Snapshot of every tutorial's progress, keyed by tutorial id
pub type ProgressMap = BTreeMap<String, TutorialProgress>;

/// Milliseconds since the Unix epoch.
///
/// Integer millis round-trip losslessly through JSON and are precise
/// enough to order `started_at` against `completed_at`.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Persisted record of how far a user has advanced through one tutorial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialProgress {
    pub tutorial_id: String,
    /// 0-based index into the tutorial's steps; equals `steps.len()` once
    /// the final step has been passed
    pub current_step: usize,
    pub completed: bool,
    pub started_at: u64,
    /// Set exactly once, when `completed` transitions to true
    pub completed_at: Option<u64>,
    /// Step ids marked skipped; grows monotonically within a run
    #[serde(default)]
    pub skipped_steps: BTreeSet<String>,
}

impl TutorialProgress {
    /// Fresh record for a just-started tutorial
    pub fn start(tutorial_id: impl Into<String>) -> Self {
        Self {
            tutorial_id: tutorial_id.into(),
            current_step: 0,
            completed: false,
            started_at: now_millis(),
            completed_at: None,
            skipped_steps: BTreeSet::new(),
        }
    }
}

/// Durable storage the progress book persists through.
///
/// Synchronous from the engine's perspective; an async-backed host
/// implementation must present a stable in-memory snapshot here.
pub trait DurableStore: Send + Sync {
    /// Load the stored snapshot. `Ok(None)` means nothing stored yet;
    /// `Err` means the data exists but is unreadable.
    fn load(&self) -> Result<Option<ProgressMap>>;

    /// Replace the stored snapshot
    fn save(&self, map: &ProgressMap) -> Result<()>;
}

/// In-memory store for tests and deliberately ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Option<ProgressMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the store, as if a previous session had saved `map`
    pub fn seeded(map: ProgressMap) -> Self {
        Self {
            inner: Mutex::new(Some(map)),
        }
    }
}

impl DurableStore for MemoryStore {
    fn load(&self) -> Result<Option<ProgressMap>> {
        Ok(self.inner.lock().expect("store lock poisoned").clone())
    }

    fn save(&self, map: &ProgressMap) -> Result<()> {
        *self.inner.lock().expect("store lock poisoned") = Some(map.clone());
        Ok(())
    }
}

/// JSON-file-backed store
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DurableStore for FileStore {
    fn load(&self) -> Result<Option<ProgressMap>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let map: ProgressMap = serde_json::from_str(&content)?;
        Ok(Some(map))
    }

    fn save(&self, map: &ProgressMap) -> Result<()> {
        let json = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Owns the in-memory progress snapshot and its durable backing.
///
/// Mutated only through the sequencer's transition handlers.
pub struct ProgressBook {
    map: ProgressMap,
    store: Box<dyn DurableStore>,
    sink: Arc<dyn DiagnosticsSink>,
    /// Set after the first failed save; suppresses repeat diagnostics
    memory_only: bool,
}

impl ProgressBook {
    /// Load the book once at engine startup.
    ///
    /// Corrupt or unreadable stored data is discarded: the book starts
    /// empty and a `ProgressCorrupted` diagnostic is emitted.
    pub fn open(store: Box<dyn DurableStore>, sink: Arc<dyn DiagnosticsSink>) -> Self {
        let map = match store.load() {
            Ok(Some(map)) => map,
            Ok(None) => ProgressMap::new(),
            Err(err) => {
                sink.emit(&Diagnostic::ProgressCorrupted {
                    detail: err.to_string(),
                });
                ProgressMap::new()
            }
        };
        Self {
            map,
            store,
            sink,
            memory_only: false,
        }
    }

    pub fn get(&self, tutorial_id: &str) -> Option<&TutorialProgress> {
        self.map.get(tutorial_id)
    }

    /// Current full snapshot
    pub fn snapshot(&self) -> &ProgressMap {
        &self.map
    }

    /// Ids of every completed tutorial
    pub fn completed_set(&self) -> BTreeSet<String> {
        self.map
            .values()
            .filter(|p| p.completed)
            .map(|p| p.tutorial_id.clone())
            .collect()
    }

    /// Insert or overwrite a record, then persist
    pub fn record(&mut self, progress: TutorialProgress) {
        self.map.insert(progress.tutorial_id.clone(), progress);
        self.persist();
    }

    /// Apply `mutate` to an existing record, then persist. No-op when the
    /// record does not exist.
    pub fn update<F>(&mut self, tutorial_id: &str, mutate: F)
    where
        F: FnOnce(&mut TutorialProgress),
    {
        if let Some(progress) = self.map.get_mut(tutorial_id) {
            mutate(progress);
            self.persist();
        }
    }

    fn persist(&mut self) {
        if self.memory_only {
            return;
        }
        if let Err(err) = self.store.save(&self.map) {
            self.memory_only = true;
            self.sink.emit(&Diagnostic::StoreUnavailable {
                detail: err.to_string(),
            });
        }
    }

    /// True once a failed save has flipped the session to memory-only
    #[inline]
    pub fn is_memory_only(&self) -> bool {
        self.memory_only
    }
}
