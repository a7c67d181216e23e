//! Test tree, host boundary and reconciliation.
//!
//! The tree has one node per configuration at the top level; below that the
//! shape follows the framework:
//!
//! ```text
//! configuration -> result file -> suite   -> test
//! configuration -> result file -> feature -> scenario -> step
//! ```

mod host;
mod node;
mod reconcile;
mod run_state;

pub use host::{HostEvent, RecordingHost, RunReporter, TreeHost};
pub use node::{SourceRange, TestTree, TreeNode, ROOT_ID};
pub use reconcile::{
    reconcile_children, remove_missing_by_id, remove_missing_by_label, DesiredChild,
    ReportReconciler, Upserted,
};
pub use run_state::{RunCounts, RunLedger, RunState};
