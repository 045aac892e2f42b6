//! Parent-child containment rules for edits.
//!
//! Read paths tolerate broken parent links (see [`super::build`]); write paths
//! do not. Before an item is added or moved, these checks enforce that:
//!
//! - the parent exists,
//! - the parent is a category (only categories may contain other nodes),
//! - the move does not place a node under its own subtree.
//!
//! # Cycle prevention
//!
//! [`validate_reparent`] collects the subtree of the node being moved and
//! rejects any proposed parent inside it, including the node itself.

use std::collections::HashSet;

use super::descendants::collect_descendants;
use crate::error::{EngineError, ValidationError};
use crate::model::item::{ItemType, WorkItem};

/// Find an item by id.
#[must_use]
pub fn find<'a>(items: &'a [WorkItem], id: &str) -> Option<&'a WorkItem> {
    items.iter().find(|i| i.id == id)
}

/// Ancestor chain of `item_id`, from immediate parent up to the root.
///
/// An unresolvable parent ends the chain, as does a repeated id.
///
/// # Errors
///
/// Returns [`EngineError::ItemNotFound`] if `item_id` does not exist.
pub fn ancestors<'a>(
    items: &'a [WorkItem],
    item_id: &str,
) -> Result<Vec<&'a WorkItem>, EngineError> {
    let start = find(items, item_id).ok_or_else(|| EngineError::ItemNotFound(item_id.to_string()))?;

    let mut chain = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(start.id.as_str());

    let mut next = start.parent_id.as_deref();
    while let Some(parent_id) = next {
        if !visited.insert(parent_id) {
            break; // cycle guard
        }
        let Some(parent) = find(items, parent_id) else {
            break;
        };
        chain.push(parent);
        next = parent.parent_id.as_deref();
    }

    Ok(chain)
}

/// Check that `parent_id` may contain `item_id`.
///
/// `None` (a root placement) is always allowed.
///
/// # Errors
///
/// Returns [`ValidationError::ParentNotFound`] or
/// [`ValidationError::ParentNotCategory`].
pub fn validate_parent(
    items: &[WorkItem],
    item_id: &str,
    parent_id: Option<&str>,
) -> Result<(), ValidationError> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };
    let parent = find(items, parent_id).ok_or_else(|| ValidationError::ParentNotFound {
        item_id: item_id.to_string(),
        parent_id: parent_id.to_string(),
    })?;
    if parent.item_type != ItemType::Category {
        return Err(ValidationError::ParentNotCategory {
            item_id: item_id.to_string(),
            parent_id: parent_id.to_string(),
        });
    }
    Ok(())
}

/// Validate moving `item_id` under `new_parent_id` (or to the root level).
///
/// # Errors
///
/// Returns [`EngineError::ItemNotFound`] if `item_id` does not exist, or a
/// [`ValidationError`] if the parent is missing, not a category, or inside
/// the moved subtree.
pub fn validate_reparent(
    items: &[WorkItem],
    item_id: &str,
    new_parent_id: Option<&str>,
) -> Result<(), EngineError> {
    if find(items, item_id).is_none() {
        return Err(EngineError::ItemNotFound(item_id.to_string()));
    }

    let Some(new_parent_id) = new_parent_id else {
        return Ok(());
    };

    let subtree = collect_descendants(items, item_id);
    if subtree.contains(new_parent_id) {
        return Err(ValidationError::CycleDetected {
            item_id: item_id.to_string(),
            proposed_parent: new_parent_id.to_string(),
        }
        .into());
    }

    validate_parent(items, item_id, Some(new_parent_id))?;
    Ok(())
}
