//! engine
//!
//! The branch reconciliation engine.
//!
//! # Architecture
//!
//! Three components, leaves first:
//!
//! - [`graph`] - Graph comparator: ahead/behind counts between two refs
//! - [`harvest`] - Commit harvester: the commits on a branch but not its base
//! - [`reconcile`] - Branch reconciler: the state machine producing a
//!   [`ReconciliationResult`]
//!
//! [`scope`] holds the guard that releases the reconciler's scratch state.
//!
//! Everything here is generic over [`crate::git::CommandSurface`], so the
//! engine can be driven by the real `git` executable or by a scripted double.

pub mod graph;
pub mod harvest;
pub mod reconcile;
pub mod scope;

pub use harvest::build_branch_commits;
pub use reconcile::{
    reconcile, Action, ReconcileError, ReconcileOptions, ReconcileRequest, ReconciliationResult,
    WorkingBase,
};
pub use scope::Workspace;
