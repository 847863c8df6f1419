//! Tutorial catalog: data model and validating loader
//!
//! The catalog is the engine's read-only input: a registry of tutorial
//! definitions validated once at load time. Malformed entries (no steps,
//! duplicate ids, dangling prerequisites) indicate a content-authoring bug,
//! so they are rejected loudly at load and kept out of the startable set —
//! without affecting the other entries.
//!
//! Step callbacks (`validation`, `on_complete`) are code, not content, so
//! they are excluded from serialization; hosts deserialize a catalog from
//! JSON and then attach hooks to the steps that need them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::types::{Difficulty, StepAction, StepPosition};

/// Synchronous completion-condition predicate for a step.
///
/// `Ok(true)` means the step's condition holds, `Ok(false)` means not yet,
/// `Err` is treated as "not yet" plus a diagnostic.
pub type ValidateFn =
    Arc<dyn Fn(&TutorialStep) -> std::result::Result<bool, String> + Send + Sync>;

/// Side-effecting callback fired when a step is finished
pub type CompleteFn = Arc<dyn Fn(&TutorialStep) + Send + Sync>;

/// How a step's completion condition is checked
#[derive(Clone)]
pub enum Validator {
    /// Checked inline by the sequencer during `next()`
    Sync(ValidateFn),
    /// Checked by the host through the sequencer's validation-ticket API
    /// (`begin_validation` / `finish_validation`)
    Deferred,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Validator::Sync(..)"),
            Self::Deferred => f.write_str("Validator::Deferred"),
        }
    }
}

/// Non-serializable callbacks attached to a step after catalog load
#[derive(Default, Clone)]
pub struct StepHooks {
    pub validation: Option<Validator>,
    pub on_complete: Option<CompleteFn>,
}

impl fmt::Debug for StepHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepHooks")
            .field("validation", &self.validation)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// One screen/overlay of a tutorial, optionally bound to a live UI element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorialStep {
    /// Unique within its tutorial (not globally)
    pub id: String,
    pub title: String,
    pub content: String,
    /// Host-resolvable element identifier; absent means no highlight
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub position: StepPosition,
    /// Advisory interaction hint, never enforced by the engine
    #[serde(default)]
    pub action: Option<StepAction>,
    #[serde(default)]
    pub optional: bool,
    #[serde(skip)]
    pub hooks: StepHooks,
}

impl TutorialStep {
    /// Create a minimal targetless step
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            target: None,
            position: StepPosition::Center,
            action: None,
            optional: false,
            hooks: StepHooks::default(),
        }
    }

    /// Bind this step to a target element at the given position
    pub fn with_target(mut self, target: impl Into<String>, position: StepPosition) -> Self {
        self.target = Some(target.into());
        self.position = position;
        self
    }

    pub fn with_action(mut self, action: StepAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Attach a synchronous completion-condition predicate
    pub fn with_validation(mut self, validate: ValidateFn) -> Self {
        self.hooks.validation = Some(Validator::Sync(validate));
        self
    }

    /// Mark this step as validated by the host through the ticket API
    pub fn with_deferred_validation(mut self) -> Self {
        self.hooks.validation = Some(Validator::Deferred);
        self
    }

    /// Attach a side-effecting completion callback
    pub fn with_on_complete(mut self, hook: CompleteFn) -> Self {
        self.hooks.on_complete = Some(hook);
        self
    }
}

/// Rewards granted when a tutorial completes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rewards {
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub badge: Option<String>,
    /// Tutorial ids this completion is meant to unlock
    #[serde(default)]
    pub unlock: Vec<String>,
}

/// A named, ordered sequence of steps with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tutorial {
    /// Unique across the catalog
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Estimated completion time in minutes, informational only
    #[serde(default)]
    pub estimated_time: u32,
    /// Tutorial ids that must be completed first (forms a DAG)
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Never empty in a valid catalog entry; order is significant and fixed
    pub steps: Vec<TutorialStep>,
    #[serde(default)]
    pub rewards: Option<Rewards>,
}

impl Tutorial {
    /// Create a tutorial with the given steps and no metadata
    pub fn new(id: impl Into<String>, title: impl Into<String>, steps: Vec<TutorialStep>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category: String::new(),
            difficulty: Difficulty::Beginner,
            estimated_time: 0,
            prerequisites: Vec::new(),
            steps,
            rewards: None,
        }
    }

    pub fn with_prerequisites(mut self, prerequisites: Vec<String>) -> Self {
        self.prerequisites = prerequisites;
        self
    }

    pub fn with_rewards(mut self, rewards: Rewards) -> Self {
        self.rewards = Some(rewards);
        self
    }

    /// True if every prerequisite id is in `completed`
    pub fn prerequisites_met(&self, completed: &BTreeSet<String>) -> bool {
        self.prerequisites.iter().all(|p| completed.contains(p))
    }
}

/// Reasons a tutorial definition is rejected at catalog load
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("tutorial '{id}' has no steps")]
    EmptySteps { id: String },

    #[error("tutorial '{id}' declares duplicate step id '{step}'")]
    DuplicateStepId { id: String, step: String },

    #[error("tutorial id '{id}' is declared more than once")]
    DuplicateTutorialId { id: String },

    #[error("tutorial '{id}' requires unknown prerequisite '{prerequisite}'")]
    DanglingPrerequisite { id: String, prerequisite: String },
}

/// Validated, read-only registry of tutorials.
///
/// Entry order follows the input; rejected entries are retained with their
/// reasons so callers can report authoring bugs.
#[derive(Debug, Default)]
pub struct Catalog {
    tutorials: Vec<Tutorial>,
    index: BTreeMap<String, usize>,
    rejected: Vec<(String, CatalogError)>,
}

impl Catalog {
    /// Build a catalog, validating every entry.
    ///
    /// Invalid entries are excluded from the startable set (and logged at
    /// error level) without affecting the rest.
    pub fn new(definitions: Vec<Tutorial>) -> Self {
        // Prerequisites may reference any declared id, even one that is
        // itself rejected; such a tutorial just never becomes available.
        let declared: BTreeSet<String> = definitions.iter().map(|t| t.id.clone()).collect();

        let mut catalog = Self::default();
        for tutorial in definitions {
            match Self::validate(&tutorial, &declared, &catalog.index) {
                Ok(()) => {
                    catalog.index.insert(tutorial.id.clone(), catalog.tutorials.len());
                    catalog.tutorials.push(tutorial);
                }
                Err(err) => {
                    tracing::error!("rejecting tutorial '{}': {}", tutorial.id, err);
                    catalog.rejected.push((tutorial.id, err));
                }
            }
        }
        catalog
    }

    /// Parse a JSON array of tutorial definitions, then validate
    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<Tutorial> = serde_json::from_str(json)?;
        Ok(Self::new(definitions))
    }

    fn validate(
        tutorial: &Tutorial,
        declared: &BTreeSet<String>,
        index: &BTreeMap<String, usize>,
    ) -> std::result::Result<(), CatalogError> {
        if index.contains_key(&tutorial.id) {
            return Err(CatalogError::DuplicateTutorialId {
                id: tutorial.id.clone(),
            });
        }

        if tutorial.steps.is_empty() {
            return Err(CatalogError::EmptySteps {
                id: tutorial.id.clone(),
            });
        }

        let mut seen = BTreeSet::new();
        for step in &tutorial.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(CatalogError::DuplicateStepId {
                    id: tutorial.id.clone(),
                    step: step.id.clone(),
                });
            }
        }

        for prerequisite in &tutorial.prerequisites {
            if !declared.contains(prerequisite) {
                return Err(CatalogError::DanglingPrerequisite {
                    id: tutorial.id.clone(),
                    prerequisite: prerequisite.clone(),
                });
            }
        }

        Ok(())
    }

    /// Look up a valid tutorial by id
    pub fn get(&self, id: &str) -> Option<&Tutorial> {
        self.index.get(id).map(|&i| &self.tutorials[i])
    }

    /// Attach hooks to one step of a loaded tutorial.
    ///
    /// Hooks are the only post-load mutation the catalog allows, so the
    /// structure checked at load time stays frozen. Returns `false` when
    /// the tutorial or step id is unknown.
    pub fn attach_hooks(&mut self, tutorial_id: &str, step_id: &str, hooks: StepHooks) -> bool {
        let Some(&i) = self.index.get(tutorial_id) else {
            return false;
        };
        match self.tutorials[i].steps.iter_mut().find(|s| s.id == step_id) {
            Some(step) => {
                step.hooks = hooks;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Valid tutorials, in input order
    pub fn iter(&self) -> impl Iterator<Item = &Tutorial> {
        self.tutorials.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tutorials.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tutorials.is_empty()
    }

    /// Entries rejected at load time, with their reasons
    pub fn rejected(&self) -> &[(String, CatalogError)] {
        &self.rejected
    }

    /// Tutorials whose prerequisites are all satisfied by `completed`.
    ///
    /// Display-level gating: the sequencer itself will start any valid
    /// tutorial regardless of prerequisites.
    pub fn available(&self, completed: &BTreeSet<String>) -> Vec<&Tutorial> {
        self.tutorials
            .iter()
            .filter(|t| t.prerequisites_met(completed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str) -> TutorialStep {
        TutorialStep::new(id, format!("Step {id}"), "content")
    }

    fn tutorial(id: &str, steps: Vec<TutorialStep>) -> Tutorial {
        Tutorial::new(id, format!("Tutorial {id}"), steps)
    }

    #[test]
    fn test_valid_catalog_keeps_input_order() {
        let catalog = Catalog::new(vec![
            tutorial("b", vec![step("s1")]),
            tutorial("a", vec![step("s1")]),
        ]);
        assert_eq!(catalog.len(), 2);
        let ids: Vec<_> = catalog.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert!(catalog.rejected().is_empty());
    }

    #[test]
    fn test_empty_steps_rejected_without_poisoning_others() {
        let catalog = Catalog::new(vec![
            tutorial("good", vec![step("s1")]),
            tutorial("bad", vec![]),
        ]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("good"));
        assert!(!catalog.contains("bad"));
        assert_eq!(catalog.rejected().len(), 1);
        assert!(matches!(
            catalog.rejected()[0].1,
            CatalogError::EmptySteps { .. }
        ));
    }

    #[test]
    fn test_duplicate_step_id_rejected() {
        let catalog = Catalog::new(vec![tutorial("t", vec![step("s1"), step("s1")])]);
        assert!(catalog.is_empty());
        assert!(matches!(
            catalog.rejected()[0].1,
            CatalogError::DuplicateStepId { .. }
        ));
    }

    #[test]
    fn test_duplicate_tutorial_id_rejects_later_entry() {
        let catalog = Catalog::new(vec![
            tutorial("t", vec![step("s1")]),
            tutorial("t", vec![step("other")]),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("t").unwrap().steps[0].id, "s1");
        assert!(matches!(
            catalog.rejected()[0].1,
            CatalogError::DuplicateTutorialId { .. }
        ));
    }

    #[test]
    fn test_dangling_prerequisite_rejected() {
        let catalog = Catalog::new(vec![
            tutorial("t1", vec![step("s1")]),
            tutorial("t2", vec![step("s1")]).with_prerequisites(vec!["ghost".into()]),
        ]);
        assert_eq!(catalog.len(), 1);
        assert!(matches!(
            catalog.rejected()[0].1,
            CatalogError::DanglingPrerequisite { .. }
        ));
    }

    #[test]
    fn test_prerequisite_may_reference_declared_but_rejected_entry() {
        // "broken" is declared (so the reference is not dangling) but is
        // itself rejected; "t2" stays valid and simply never unlocks.
        let catalog = Catalog::new(vec![
            tutorial("broken", vec![]),
            tutorial("t2", vec![step("s1")]).with_prerequisites(vec!["broken".into()]),
        ]);
        assert!(catalog.contains("t2"));
        assert!(!catalog.contains("broken"));
    }

    #[test]
    fn test_available_filters_on_completed_set() {
        let catalog = Catalog::new(vec![
            tutorial("t1", vec![step("s1")]),
            tutorial("t2", vec![step("s1")]).with_prerequisites(vec!["t1".into()]),
        ]);

        let none = BTreeSet::new();
        let available: Vec<_> = catalog.available(&none).iter().map(|t| t.id.clone()).collect();
        assert_eq!(available, ["t1"]);

        let mut done = BTreeSet::new();
        done.insert("t1".to_string());
        let available: Vec<_> = catalog.available(&done).iter().map(|t| t.id.clone()).collect();
        assert_eq!(available, ["t1", "t2"]);
    }

    #[test]
    fn test_from_json_parses_and_validates() {
        let json = r##"[
            {
                "id": "welcome",
                "title": "Welcome Tour",
                "category": "onboarding",
                "difficulty": "beginner",
                "estimated_time": 5,
                "steps": [
                    {"id": "intro", "title": "Hello", "content": "Welcome!"},
                    {
                        "id": "menu",
                        "title": "The menu",
                        "content": "Open it",
                        "target": "#main-menu",
                        "position": "bottom",
                        "action": "click",
                        "optional": true
                    }
                ],
                "rewards": {"points": 10, "badge": "starter", "unlock": []}
            },
            {"id": "broken", "title": "No steps", "steps": []}
        ]"##;

        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        let t = catalog.get("welcome").unwrap();
        assert_eq!(t.steps.len(), 2);
        assert_eq!(t.steps[1].position, StepPosition::Bottom);
        assert_eq!(t.steps[1].action, Some(StepAction::Click));
        assert!(t.steps[1].optional);
        assert_eq!(t.rewards.as_ref().unwrap().points, 10);
        assert_eq!(catalog.rejected().len(), 1);
    }

    #[test]
    fn test_attach_hooks_targets_one_step_only() {
        let mut catalog = Catalog::new(vec![tutorial(
            "t1",
            vec![step("s1"), step("s2")],
        )]);

        let hooks = StepHooks {
            validation: Some(Validator::Deferred),
            on_complete: None,
        };
        assert!(catalog.attach_hooks("t1", "s2", hooks.clone()));
        let t = catalog.get("t1").unwrap();
        assert!(t.steps[0].hooks.validation.is_none());
        assert!(matches!(t.steps[1].hooks.validation, Some(Validator::Deferred)));

        // Unknown ids report failure without touching anything
        assert!(!catalog.attach_hooks("t1", "nope", hooks.clone()));
        assert!(!catalog.attach_hooks("nope", "s1", hooks));
    }

    #[test]
    fn test_hooks_survive_builder_but_not_serde() {
        let s = step("s1").with_deferred_validation();
        assert!(matches!(s.hooks.validation, Some(Validator::Deferred)));

        let json = serde_json::to_string(&s).unwrap();
        let back: TutorialStep = serde_json::from_str(&json).unwrap();
        assert!(back.hooks.validation.is_none());
    }
}
