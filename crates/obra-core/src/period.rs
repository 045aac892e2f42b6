//! Measurement period rollover.
//!
//! A project has exactly one open period (the live item list plus
//! `measurement_number`) and any number of closed periods, kept as immutable
//! [`MeasurementSnapshot`]s with the most recent first.
//!
//! | transition | from                     | to                                          |
//! |------------|--------------------------|---------------------------------------------|
//! | close      | open period N            | snapshot N prepended, open period N+1       |
//! | reopen     | open N+1, snapshot N     | open period N restored, snapshot N removed  |
//!
//! Both are single value transformations over a borrowed [`Project`]. The
//! caller persists the result as one unit; the engine does no locking.
//! Reopen discards every edit made since the close, so callers must obtain
//! explicit confirmation first ([`reopen_preview`] describes what is lost).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, PreconditionError};
use crate::model::item::{ItemType, WorkItem};
use crate::model::project::{MeasurementSnapshot, Project};

/// Close the open period.
///
/// Captures the current items, stats, and billing into a snapshot dated
/// `today`, then rolls every item's accumulated figures into its previous
/// figures and clears the current period.
///
/// # Errors
///
/// Returns [`PreconditionError::NothingMeasured`] when no item has a non-zero
/// current quantity or total.
pub fn close_period(project: &Project, today: NaiveDate) -> Result<Project, EngineError> {
    if !project.items.iter().any(WorkItem::has_current_progress) {
        return Err(PreconditionError::NothingMeasured {
            measurement_number: project.measurement_number,
        }
        .into());
    }

    let stats = project.stats();
    let snapshot = MeasurementSnapshot {
        measurement_number: project.measurement_number,
        date: today,
        items: project.items.clone(),
        stats,
        billing: project.billing_for(&stats),
        overhead_index: project.overhead_index,
        current_total_override: project.current_total_override,
    };

    let items = project
        .items
        .iter()
        .map(|item| rotate(item, project.overhead_index))
        .collect();

    let mut history = Vec::with_capacity(project.history.len() + 1);
    history.push(snapshot);
    history.extend(project.history.iter().cloned());

    tracing::debug!(
        measurement = project.measurement_number,
        current_total = stats.current_total,
        accumulated_total = stats.accumulated_total,
        "closed measurement period"
    );

    Ok(Project {
        items,
        history,
        measurement_number: project.measurement_number + 1,
        // A period-specific override does not carry into the next period.
        current_total_override: None,
        ..project.clone()
    })
}

fn rotate(item: &WorkItem, overhead_index: f64) -> WorkItem {
    if item.item_type == ItemType::Category {
        return item.clone();
    }
    let figures = item.figures(overhead_index);
    WorkItem {
        previous_quantity: figures.accumulated_quantity,
        previous_total: figures.accumulated_total,
        current_quantity: 0.0,
        current_total: 0.0,
        ..item.clone()
    }
}

/// Reopen the most recently closed period.
///
/// The open item list and measurement number are replaced with exactly what
/// the snapshot captured, and the snapshot leaves the history.
///
/// # Errors
///
/// Returns [`PreconditionError::NoClosedPeriod`] when history is empty and
/// [`PreconditionError::NotLatestSnapshot`] when `measurement_number` is not
/// the most recent snapshot.
pub fn reopen_period(project: &Project, measurement_number: u32) -> Result<Project, EngineError> {
    let latest = check_reopen(project, measurement_number)?;

    tracing::debug!(
        measurement = measurement_number,
        discarded_from = project.measurement_number,
        "reopened measurement period"
    );

    Ok(Project {
        items: latest.items.clone(),
        measurement_number: latest.measurement_number,
        current_total_override: latest.current_total_override,
        history: project.history[1..].to_vec(),
        ..project.clone()
    })
}

fn check_reopen(
    project: &Project,
    requested: u32,
) -> Result<&MeasurementSnapshot, PreconditionError> {
    let latest = project
        .latest_snapshot()
        .ok_or(PreconditionError::NoClosedPeriod)?;
    if latest.measurement_number != requested {
        return Err(PreconditionError::NotLatestSnapshot {
            requested,
            latest: latest.measurement_number,
        });
    }
    Ok(latest)
}

/// What a reopen would discard, for confirmation prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReopenPreview {
    pub measurement_number: u32,
    pub discarded_period: u32,
    /// Items present both now and in the snapshot whose fields differ,
    /// ignoring the rotation the close itself performed.
    pub changed_items: Vec<String>,
    /// Items added since the close; they disappear on reopen.
    pub removed_items: Vec<String>,
    /// Items deleted since the close; they come back on reopen.
    pub restored_items: Vec<String>,
}

impl ReopenPreview {
    #[must_use]
    pub fn discards_edits(&self) -> bool {
        !(self.changed_items.is_empty()
            && self.removed_items.is_empty()
            && self.restored_items.is_empty())
    }
}

/// Describe the effect of [`reopen_period`] without applying it.
///
/// # Errors
///
/// Same preconditions as [`reopen_period`].
pub fn reopen_preview(
    project: &Project,
    measurement_number: u32,
) -> Result<ReopenPreview, EngineError> {
    let latest = check_reopen(project, measurement_number)?;

    let mut changed_items = Vec::new();
    let mut removed_items = Vec::new();
    for item in &project.items {
        match latest.items.iter().find(|s| s.id == item.id) {
            Some(captured) => {
                if rotate(captured, latest.overhead_index) != *item {
                    changed_items.push(item.id.clone());
                }
            }
            None => removed_items.push(item.id.clone()),
        }
    }
    let restored_items = latest
        .items
        .iter()
        .filter(|s| project.item(&s.id).is_none())
        .map(|s| s.id.clone())
        .collect();

    Ok(ReopenPreview {
        measurement_number,
        discarded_period: project.measurement_number,
        changed_items,
        removed_items,
        restored_items,
    })
}
