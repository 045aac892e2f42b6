//! Flat parent-referencing list to ordered forest.
//!
//! The [`Forest`] is an arena of indices into the caller's slice: parent and
//! child links are `usize` positions, never owning pointers, so the input may
//! contain dangling or cyclic parent references without any ownership issue.
//!
//! # Recovery policy
//!
//! Building never fails. A node whose parent id is empty, unknown, or itself
//! becomes a root. Nodes caught in a parent cycle cannot be reached from any
//! root; the first such node in input order is promoted to a root, which
//! breaks the cycle while keeping every node in the output exactly once.

use std::collections::HashMap;

use super::TreeNode;

/// One node reached during a pre-order walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    /// Position of the node in the input slice.
    pub index: usize,
    /// Zero for roots. Used for indentation only.
    pub depth: usize,
    /// Dotted 1-based positional label, e.g. `"2.1"`.
    pub wbs: String,
}

/// Ordered forest over a slice of [`TreeNode`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest {
    roots: Vec<usize>,
    children: Vec<Vec<usize>>,
    parent: Vec<Option<usize>>,
}

impl Forest {
    /// Build the forest for `nodes`.
    ///
    /// Siblings (and roots) are ordered by [`TreeNode::order`], ties broken by
    /// input position, so identical input always yields an identical forest.
    pub fn build<T: TreeNode>(nodes: &[T]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            // First occurrence owns the id.
            index.entry(node.id()).or_insert(i);
        }

        let mut parent: Vec<Option<usize>> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let parent_id = node.parent_id().filter(|p| !p.is_empty())?;
                match index.get(parent_id) {
                    Some(&p) if p != i => Some(p),
                    Some(_) => {
                        tracing::debug!(id = node.id(), "node is its own parent; treating as root");
                        None
                    }
                    None => {
                        tracing::debug!(
                            id = node.id(),
                            parent_id,
                            "parent not found; treating as root"
                        );
                        None
                    }
                }
            })
            .collect();

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (i, p) in parent.iter().enumerate() {
            if let Some(p) = *p {
                children[p].push(i);
            }
        }

        let mut reached = vec![false; nodes.len()];
        for i in 0..nodes.len() {
            if parent[i].is_none() {
                mark_subtree(i, &children, &mut reached);
            }
        }

        for i in 0..nodes.len() {
            if reached[i] {
                continue;
            }
            if let Some(p) = parent[i].take() {
                tracing::warn!(
                    id = nodes[i].id(),
                    parent_id = nodes[p].id(),
                    "parent cycle detected; promoting node to root"
                );
                children[p].retain(|&c| c != i);
            }
            mark_subtree(i, &children, &mut reached);
        }

        let sort_key = |&i: &usize| (nodes[i].order(), i);
        for siblings in &mut children {
            siblings.sort_by_key(sort_key);
        }
        let mut roots: Vec<usize> = (0..nodes.len()).filter(|&i| parent[i].is_none()).collect();
        roots.sort_by_key(sort_key);

        Self {
            roots,
            children,
            parent,
        }
    }

    /// Indices of root nodes, in display order.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Indices of the direct children of `index`, in display order.
    #[must_use]
    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map_or(&[], Vec::as_slice)
    }

    /// Resolved parent of `index`, after orphan and cycle recovery.
    #[must_use]
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parent.get(index).copied().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Pre-order walk: each node is followed by its full subtree before its
    /// next sibling. Every node appears exactly once.
    #[must_use]
    pub fn preorder(&self) -> Vec<Visit> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<Visit> = self
            .roots
            .iter()
            .enumerate()
            .rev()
            .map(|(pos, &index)| Visit {
                index,
                depth: 0,
                wbs: (pos + 1).to_string(),
            })
            .collect();
        while let Some(visit) = stack.pop() {
            let children = self.children(visit.index);
            stack.extend(children.iter().enumerate().rev().map(|(pos, &index)| Visit {
                index,
                depth: visit.depth + 1,
                wbs: format!("{}.{}", visit.wbs, pos + 1),
            }));
            out.push(visit);
        }
        out
    }
}

fn mark_subtree(start: usize, children: &[Vec<usize>], reached: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        if reached[i] {
            continue;
        }
        reached[i] = true;
        stack.extend(children[i].iter().copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ParentLinked;

    #[derive(Debug, Clone)]
    struct Node {
        id: &'static str,
        parent: Option<&'static str>,
        order: i64,
    }

    impl ParentLinked for Node {
        fn id(&self) -> &str {
            self.id
        }
        fn parent_id(&self) -> Option<&str> {
            self.parent
        }
    }

    impl TreeNode for Node {
        fn order(&self) -> i64 {
            self.order
        }
    }

    fn node(id: &'static str, parent: Option<&'static str>, order: i64) -> Node {
        Node { id, parent, order }
    }

    fn labels(nodes: &[Node]) -> Vec<(String, &'static str)> {
        Forest::build(nodes)
            .preorder()
            .into_iter()
            .map(|v| (v.wbs, nodes[v.index].id))
            .collect()
    }

    #[test]
    fn empty_input_builds_empty_forest() {
        let forest = Forest::build::<Node>(&[]);
        assert!(forest.is_empty());
        assert!(forest.preorder().is_empty());
    }

    #[test]
    fn siblings_follow_order_not_input_position() {
        let nodes = [
            node("b", None, 2),
            node("a", None, 1),
            node("a2", Some("a"), 5),
            node("a1", Some("a"), 1),
        ];
        assert_eq!(
            labels(&nodes),
            vec![
                ("1".to_string(), "a"),
                ("1.1".to_string(), "a1"),
                ("1.2".to_string(), "a2"),
                ("2".to_string(), "b"),
            ]
        );
    }

    #[test]
    fn equal_order_keeps_input_position() {
        let nodes = [node("x", None, 0), node("y", None, 0), node("z", None, 0)];
        let ids: Vec<_> = labels(&nodes).into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn unknown_parent_becomes_root() {
        let nodes = [node("a", None, 1), node("orphan", Some("missing"), 0)];
        let forest = Forest::build(&nodes);
        assert_eq!(forest.roots(), &[1, 0]);
        assert_eq!(forest.parent(1), None);
    }

    #[test]
    fn self_parent_becomes_root() {
        let nodes = [node("a", Some("a"), 0)];
        let forest = Forest::build(&nodes);
        assert_eq!(forest.roots(), &[0]);
    }

    #[test]
    fn parent_cycle_is_broken_at_first_member() {
        // a -> b -> c -> a, plus a proper root.
        let nodes = [
            node("root", None, 0),
            node("a", Some("c"), 1),
            node("b", Some("a"), 0),
            node("c", Some("b"), 0),
        ];
        let forest = Forest::build(&nodes);
        let visits = forest.preorder();
        assert_eq!(visits.len(), 4, "every node appears once");
        assert_eq!(forest.parent(1), None, "first cycle member promoted");
        assert_eq!(forest.parent(2), Some(1));
        assert_eq!(forest.parent(3), Some(2));
        assert_eq!(
            labels(&nodes),
            vec![
                ("1".to_string(), "root"),
                ("2".to_string(), "a"),
                ("2.1".to_string(), "b"),
                ("2.1.1".to_string(), "c"),
            ]
        );
    }

    #[test]
    fn depth_tracks_nesting() {
        let nodes = [
            node("a", None, 0),
            node("b", Some("a"), 0),
            node("c", Some("b"), 0),
        ];
        let depths: Vec<_> = Forest::build(&nodes)
            .preorder()
            .into_iter()
            .map(|v| v.depth)
            .collect();
        assert_eq!(depths, vec![0, 1, 2]);
    }

    #[test]
    fn duplicate_ids_resolve_to_first_occurrence() {
        let nodes = [
            node("a", None, 0),
            node("a", None, 1),
            node("child", Some("a"), 0),
        ];
        let forest = Forest::build(&nodes);
        assert_eq!(forest.parent(2), Some(0));
        assert_eq!(forest.children(1), &[] as &[usize]);
    }

    #[test]
    fn deep_chain_walks_without_recursion() {
        use crate::model::item::WorkItem;

        let nodes: Vec<WorkItem> = (0..10_000)
            .map(|i| {
                let node = WorkItem::category(format!("n{i}"), "Level");
                if i == 0 {
                    node
                } else {
                    node.with_parent(format!("n{}", i - 1))
                }
            })
            .collect();
        let visits = Forest::build(&nodes).preorder();
        assert_eq!(visits.len(), 10_000);
        assert_eq!(visits[9_999].index, 9_999);
        assert_eq!(visits[9_999].depth, 9_999);
        assert_eq!(visits[2].wbs, "1.1.1");
    }

    #[test]
    fn build_is_deterministic() {
        let nodes = [
            node("a", None, 3),
            node("b", Some("a"), 1),
            node("c", Some("zz"), 0),
            node("d", Some("a"), 1),
        ];
        assert_eq!(Forest::build(&nodes), Forest::build(&nodes));
    }
}
