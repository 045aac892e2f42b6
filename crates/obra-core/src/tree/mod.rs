//! Work breakdown structure as an id-indexed forest.
//!
//! Records arrive as a flat list where each node names its parent by id. The
//! submodules turn that list into an ordered forest and compute everything
//! that depends on position in it.
//!
//! ## Submodules
//!
//! - [`build`] — flat list to ordered [`Forest`] arena, tolerant of orphans
//!   and parent cycles.
//! - [`aggregate`] — WBS labels, bottom-up category totals, display
//!   flattening, and project-wide stats.
//! - [`descendants`] — fixed-point transitive closure for cascading deletes.
//! - [`hierarchy`] — ancestor chains and parent/reparent validation for edits.

pub mod aggregate;
pub mod build;
pub mod descendants;
pub mod hierarchy;

pub use aggregate::{AggregateStats, WbsReport, WbsRow, aggregate};
pub use build::{Forest, Visit};
pub use descendants::{CascadePlan, Reference, collect_descendants, plan_cascade_delete};

/// A record that names its parent by id.
pub trait ParentLinked {
    fn id(&self) -> &str;
    fn parent_id(&self) -> Option<&str>;
}

/// A [`ParentLinked`] record that also carries a sibling sort key.
pub trait TreeNode: ParentLinked {
    fn order(&self) -> i64;
}
