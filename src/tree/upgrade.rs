//! The upgrade pipeline: ordered, idempotent schema migration steps.
//!
//! Each step carries the version it migrates *to* and a function that
//! rewrites the in-memory tree and document from the previous layout.
//! Steps are registered in ascending order and applied in that order;
//! a failing step is logged and recovered (the affected settings fall
//! back to their defaults), never aborting the remaining steps.

use super::node::Tree;
use crate::document::Document;
use std::fmt;
use tracing::{info, warn};

/// Schema version identifier. Versions increase monotonically; version 0
/// is a document that predates versioning.
pub type SchemaVersion = u32;

/// A migration step function.
///
/// Receives the tree, the backing document, and the version the document
/// was loaded at. Every step must be idempotent: when `previous` is at or
/// above the step's target, it must return without touching anything.
/// A missing source path means "nothing to migrate": the destination is
/// left to fall back to its default, not an error.
pub type StepFn = fn(&mut Tree, &mut Document, SchemaVersion) -> anyhow::Result<()>;

/// A registered migration step.
#[derive(Clone)]
pub struct UpgradeStep {
    /// Version this step migrates to (its source is `to - 1`).
    pub to: SchemaVersion,
    /// What this step does, for logs and reports.
    pub description: &'static str,
    /// The step function.
    pub run: StepFn,
}

impl fmt::Debug for UpgradeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpgradeStep")
            .field("to", &self.to)
            .field("description", &self.description)
            .finish()
    }
}

/// A step that was applied during an upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    pub to: SchemaVersion,
    pub description: String,
}

/// A step that failed and was recovered.
#[derive(Debug, Clone)]
pub struct StepFailure {
    pub to: SchemaVersion,
    pub reason: String,
}

/// Outcome of one `upgrade()` run.
#[derive(Debug, Clone, Default)]
pub struct UpgradeReport {
    /// Version the document was loaded at.
    pub previous: SchemaVersion,
    /// Steps applied, in order.
    pub steps_applied: Vec<AppliedStep>,
    /// Steps that failed and were recovered.
    pub failures: Vec<StepFailure>,
    /// Whether the document was newer than supported and forcibly reset.
    pub hard_downgrade: bool,
}

impl UpgradeReport {
    /// Whether any step mutated the document.
    pub fn was_migrated(&self) -> bool {
        !self.steps_applied.is_empty()
    }
}

/// Ordered sequence of migration steps.
#[derive(Debug, Default)]
pub struct UpgradePipeline {
    steps: Vec<UpgradeStep>,
}

impl UpgradePipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step migrating to `to`.
    ///
    /// # Panics
    /// Panics unless targets are registered in strictly ascending order
    /// starting at 1, since that indicates a defect in the static step
    /// list.
    pub fn register(mut self, to: SchemaVersion, description: &'static str, run: StepFn) -> Self {
        let floor = self.steps.last().map(|step| step.to).unwrap_or(0);
        assert!(
            to > floor,
            "steps must be registered in ascending order: {} then {}",
            floor,
            to
        );
        self.steps.push(UpgradeStep {
            to,
            description,
            run,
        });
        self
    }

    /// The registered steps.
    pub fn steps(&self) -> &[UpgradeStep] {
        &self.steps
    }

    /// The newest version any step migrates to (0 with no steps).
    pub fn latest(&self) -> SchemaVersion {
        self.steps.last().map(|step| step.to).unwrap_or(0)
    }

    /// Describe the steps a document at `previous` would go through.
    pub fn describe_from(&self, previous: SchemaVersion) -> Vec<String> {
        self.steps
            .iter()
            .filter(|step| step.to > previous)
            .map(|step| format!("v{} -> v{}: {}", step.to - 1, step.to, step.description))
            .collect()
    }

    /// Run every step with a target above `previous`, in ascending order.
    ///
    /// Step failures are logged and recorded; the remaining steps still
    /// run and the report carries what happened.
    pub fn apply(&self, tree: &mut Tree, doc: &mut Document, previous: SchemaVersion) -> UpgradeReport {
        let mut report = UpgradeReport {
            previous,
            ..UpgradeReport::default()
        };
        for step in self.steps.iter().filter(|step| step.to > previous) {
            info!(to = step.to, "applying config upgrade: {}", step.description);
            match (step.run)(tree, doc, previous) {
                Ok(()) => report.steps_applied.push(AppliedStep {
                    to: step.to,
                    description: step.description.to_string(),
                }),
                Err(error) => {
                    warn!(
                        to = step.to,
                        "config upgrade step failed, affected settings fall back to defaults: {error:#}"
                    );
                    report.failures.push(StepFailure {
                        to: step.to,
                        reason: format!("{error:#}"),
                    });
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::value::{ScalarSpec, ScalarValue};
    use anyhow::anyhow;

    fn fixture_tree() -> Tree {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.add_leaf(root, "flag", ScalarSpec::bool(false)).unwrap();
        tree
    }

    fn set_flag(tree: &mut Tree, _doc: &mut Document, previous: SchemaVersion) -> anyhow::Result<()> {
        if previous >= 1 {
            return Ok(());
        }
        let flag = tree.node_at("flag").expect("flag is declared");
        tree.set_value(flag, ScalarValue::Bool(true))?;
        Ok(())
    }

    fn failing_step(
        _tree: &mut Tree,
        _doc: &mut Document,
        previous: SchemaVersion,
    ) -> anyhow::Result<()> {
        if previous >= 2 {
            return Ok(());
        }
        Err(anyhow!("unexpected document shape"))
    }

    fn noop(_tree: &mut Tree, _doc: &mut Document, _previous: SchemaVersion) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn test_apply_skips_steps_at_or_below_previous() {
        let pipeline = UpgradePipeline::new()
            .register(1, "set the flag", set_flag)
            .register(2, "later step", noop);
        let mut tree = fixture_tree();
        let mut doc = Document::new();

        let report = pipeline.apply(&mut tree, &mut doc, 1);
        assert_eq!(report.steps_applied.len(), 1);
        assert_eq!(report.steps_applied[0].to, 2);
        // Step 1 never ran, so the flag kept its default.
        let flag = tree.node_at("flag").unwrap();
        assert!(!tree.bool_value(flag, &doc));
    }

    #[test]
    fn test_apply_runs_all_from_zero() {
        let pipeline = UpgradePipeline::new()
            .register(1, "set the flag", set_flag)
            .register(2, "later step", noop);
        let mut tree = fixture_tree();
        let mut doc = Document::new();

        let report = pipeline.apply(&mut tree, &mut doc, 0);
        assert_eq!(report.steps_applied.len(), 2);
        assert!(report.was_migrated());
        let flag = tree.node_at("flag").unwrap();
        assert!(tree.bool_value(flag, &doc));
    }

    #[test]
    fn test_failure_is_recovered_and_later_steps_run() {
        let pipeline = UpgradePipeline::new()
            .register(1, "set the flag", set_flag)
            .register(2, "broken step", failing_step)
            .register(3, "final step", noop);
        let mut tree = fixture_tree();
        let mut doc = Document::new();

        let report = pipeline.apply(&mut tree, &mut doc, 0);
        assert_eq!(report.steps_applied.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].to, 2);
        assert!(report.failures[0].reason.contains("unexpected document shape"));
    }

    #[test]
    fn test_describe_from() {
        let pipeline = UpgradePipeline::new()
            .register(1, "set the flag", set_flag)
            .register(2, "later step", noop);
        assert_eq!(
            pipeline.describe_from(1),
            vec!["v1 -> v2: later step".to_string()]
        );
        assert_eq!(pipeline.latest(), 2);
    }

    #[test]
    #[should_panic(expected = "ascending order")]
    fn test_register_rejects_out_of_order_targets() {
        let _ = UpgradePipeline::new()
            .register(2, "second", noop)
            .register(1, "first", noop);
    }
}
