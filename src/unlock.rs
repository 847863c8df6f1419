//! Unlock resolution and reward accounting
//!
//! Pure derivation of what a completion grants: a function of the catalog
//! and the completed-set, with no I/O of its own (the progress store has
//! already persisted the completion by the time this runs).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Tutorial};

/// What completing one tutorial granted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockOutcome {
    /// Points granted by this completion alone
    pub points_awarded: u32,
    /// Ledger total after applying this completion
    pub total_points: u32,
    pub badge: Option<String>,
    /// Tutorials that became available because of this completion.
    ///
    /// A tutorial appears here only when its prerequisites are satisfied
    /// now and were not before; completions it does not depend on never
    /// re-report it.
    pub newly_available: Vec<String>,
}

/// Accumulated rewards across completions.
///
/// Replayable: rebuilding from a completed set yields the same ledger,
/// which is how points and badges survive reloads without separate
/// persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardLedger {
    points: u32,
    badges: BTreeSet<String>,
    credited: BTreeSet<String>,
}

impl RewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the ledger from an already-completed set
    pub fn replay(catalog: &Catalog, completed: &BTreeSet<String>) -> Self {
        let mut ledger = Self::new();
        for id in completed {
            if let Some(tutorial) = catalog.get(id) {
                ledger.apply(tutorial);
            }
        }
        ledger
    }

    /// Credit one tutorial's rewards; returns the points granted.
    ///
    /// Idempotent per tutorial id: replaying a tutorial the ledger has
    /// already credited grants nothing, keeping in-session totals equal
    /// to what [`RewardLedger::replay`] rebuilds after a reload.
    pub fn apply(&mut self, tutorial: &Tutorial) -> u32 {
        if !self.credited.insert(tutorial.id.clone()) {
            return 0;
        }
        let Some(rewards) = &tutorial.rewards else {
            return 0;
        };
        self.points += rewards.points;
        if let Some(badge) = &rewards.badge {
            self.badges.insert(badge.clone());
        }
        rewards.points
    }

    #[inline]
    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn badges(&self) -> impl Iterator<Item = &str> {
        self.badges.iter().map(String::as_str)
    }

    pub fn has_badge(&self, badge: &str) -> bool {
        self.badges.contains(badge)
    }
}

/// Resolve what completing `tutorial` unlocks.
///
/// `completed` is the set BEFORE this completion; the resolver adds the
/// just-completed id itself. Newly-available = tutorials whose
/// prerequisites flip from unmet to met, unioned with the reward `unlock`
/// list filtered to catalog-valid entries whose prerequisites are met, so
/// a reward can never unlock past an unmet prerequisite.
pub fn resolve_unlocks(
    catalog: &Catalog,
    completed: &BTreeSet<String>,
    tutorial: &Tutorial,
    ledger: &mut RewardLedger,
) -> UnlockOutcome {
    let points_awarded = ledger.apply(tutorial);

    let mut after = completed.clone();
    after.insert(tutorial.id.clone());

    let mut newly: BTreeSet<String> = catalog
        .iter()
        .filter(|t| !after.contains(&t.id))
        .filter(|t| t.prerequisites_met(&after) && !t.prerequisites_met(completed))
        .map(|t| t.id.clone())
        .collect();

    if let Some(rewards) = &tutorial.rewards {
        for id in &rewards.unlock {
            let Some(candidate) = catalog.get(id) else {
                tracing::warn!(
                    "tutorial '{}' rewards unknown unlock id '{}'",
                    tutorial.id,
                    id
                );
                continue;
            };
            if !after.contains(id) && candidate.prerequisites_met(&after) {
                newly.insert(id.clone());
            }
        }
    }

    UnlockOutcome {
        points_awarded,
        total_points: ledger.points(),
        badge: tutorial.rewards.as_ref().and_then(|r| r.badge.clone()),
        newly_available: newly.into_iter().collect(),
    }
}
