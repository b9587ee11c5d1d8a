//! Hierarchical configuration node framework.
//!
//! A [`Tree`] of typed nodes addressed by dotted paths, backed by a
//! [`crate::document::Document`]:
//! - **Leaves** hold one scalar with a default and optional bounds;
//!   out-of-range values are clamped at read time, never rejected.
//! - **Containers** own named children in declaration order and may carry
//!   a gate value of their own under the reserved `value` key.
//! - **Tiered nodes** hold one value per difficulty with the normal tier
//!   as the representative value.
//!
//! [`ConfigRoot`] ties a tree to its backing file and drives the
//! [`UpgradePipeline`], which walks a document forward across schema
//! versions before first use.

mod node;
mod root;
mod upgrade;
mod value;

pub use node::{NodeId, NodeRole, SaveIssue, TierSpecs, TieredNode, Tree};
pub use root::{ConfigRoot, VERSION_KEY};
pub use upgrade::{
    AppliedStep, SchemaVersion, StepFailure, StepFn, UpgradePipeline, UpgradeReport, UpgradeStep,
};
pub use value::{Difficulty, ScalarSpec, ScalarValue};
