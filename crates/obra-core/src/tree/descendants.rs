//! Transitive closure over parent links, for cascading deletes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ParentLinked;

/// A record that points at a tree node without being part of the tree
/// (e.g. a responsibility assigned to a work item).
pub trait Reference {
    fn id(&self) -> &str;
    fn referenced_id(&self) -> &str;
}

/// Return `target` plus every record reachable from it through `parent_id`.
///
/// Fixed-point iteration: keep adding any record whose parent is already in
/// the set until a full pass adds nothing. The target is always included,
/// even when no record carries that id. Parent cycles terminate because a
/// record is only ever added once.
pub fn collect_descendants<T: ParentLinked>(records: &[T], target: &str) -> BTreeSet<String> {
    let mut found: BTreeSet<String> = BTreeSet::new();
    found.insert(target.to_string());

    loop {
        let mut added = false;
        for record in records {
            if found.contains(record.id()) {
                continue;
            }
            if record.parent_id().is_some_and(|p| found.contains(p)) {
                found.insert(record.id().to_string());
                added = true;
            }
        }
        if !added {
            break;
        }
    }

    found
}

/// Everything a cascading delete of one node must remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadePlan {
    pub target: String,
    /// The target and its whole subtree.
    pub node_ids: BTreeSet<String>,
    /// Records referencing any node in `node_ids`.
    pub reference_ids: BTreeSet<String>,
}

impl CascadePlan {
    #[must_use]
    pub fn removes_node(&self, id: &str) -> bool {
        self.node_ids.contains(id)
    }

    #[must_use]
    pub fn removes_reference(&self, id: &str) -> bool {
        self.reference_ids.contains(id)
    }
}

/// Plan the removal of `target`, its subtree, and every reference into it.
pub fn plan_cascade_delete<T: ParentLinked, R: Reference>(
    nodes: &[T],
    references: &[R],
    target: &str,
) -> CascadePlan {
    let node_ids = collect_descendants(nodes, target);
    let reference_ids = references
        .iter()
        .filter(|r| node_ids.contains(r.referenced_id()))
        .map(|r| r.id().to_string())
        .collect();

    CascadePlan {
        target: target.to_string(),
        node_ids,
        reference_ids,
    }
}
