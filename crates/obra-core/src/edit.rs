//! Editing operations over a [`Project`].
//!
//! Every function here borrows the current project and returns a new one, so
//! a failed edit leaves nothing half-applied. Callers persist the result.

use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::error::{EngineError, ValidationError};
use crate::ledger::{SupplyForecast, forecast_to_ledger};
use crate::model::item::{ItemType, WorkItem, WorkItemRecord};
use crate::model::project::{Project, Responsibility};
use crate::money::{ratio, round2};
use crate::pricing::{PriceDraft, PriceEdit};
use crate::tree::descendants::{CascadePlan, plan_cascade_delete};
use crate::tree::hierarchy::{validate_parent, validate_reparent};

/// How progress for the open period was entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum MeasureEdit {
    /// Quantity executed this period.
    Quantity(f64),
    /// Share of the contract quantity executed this period, in percent.
    Percentage(f64),
    /// Amount executed this period, overhead included.
    Total(f64),
}

impl MeasureEdit {
    const fn value(self) -> f64 {
        match self {
            Self::Quantity(v) | Self::Percentage(v) | Self::Total(v) => v,
        }
    }

    const fn field(self) -> &'static str {
        match self {
            Self::Quantity(_) => "current_quantity",
            Self::Percentage(_) => "current_percentage",
            Self::Total(_) => "current_total",
        }
    }
}

/// Next free sibling order under `parent_id`.
#[must_use]
pub fn next_order(project: &Project, parent_id: Option<&str>) -> i64 {
    next_order_among(project.items.iter(), parent_id)
}

fn next_order_among<'a>(
    items: impl Iterator<Item = &'a WorkItem>,
    parent_id: Option<&str>,
) -> i64 {
    items
        .filter(|i| i.parent_id.as_deref() == parent_id)
        .map(|i| i.order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Add a validated record to the tree.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the record is malformed, its id is
/// already taken, or its parent is missing or not a category.
pub fn add_item(project: &Project, record: WorkItemRecord) -> Result<Project, EngineError> {
    let item = WorkItem::try_from(record)?;
    if project.item(&item.id).is_some() {
        return Err(ValidationError::DuplicateId(item.id).into());
    }
    validate_parent(&project.items, &item.id, item.parent_id.as_deref())?;

    tracing::debug!(id = %item.id, kind = %item.item_type, "added work item");

    let mut next = project.clone();
    next.items.push(item);
    Ok(next)
}

fn priced_item<'a>(
    project: &'a Project,
    item_id: &str,
    field: &'static str,
) -> Result<(usize, &'a WorkItem), EngineError> {
    let (index, item) = project
        .items
        .iter()
        .enumerate()
        .find(|(_, i)| i.id == item_id)
        .ok_or_else(|| EngineError::ItemNotFound(item_id.to_string()))?;
    if item.item_type == ItemType::Category {
        return Err(ValidationError::CategoryHasPricing {
            item_id: item_id.to_string(),
            field,
        }
        .into());
    }
    Ok((index, item))
}

fn check_value(
    item_id: &str,
    field: &'static str,
    value: f64,
    allow_negative: bool,
) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            item_id: item_id.to_string(),
            field,
        });
    }
    if !allow_negative && value < 0.0 {
        return Err(ValidationError::Negative {
            item_id: item_id.to_string(),
            field,
            value,
        });
    }
    Ok(())
}

/// Reconcile one pricing edit and store the reconciled fields.
///
/// Reading the item back yields exactly the draft's prices and total.
///
/// # Errors
///
/// Returns [`EngineError::ItemNotFound`], or a [`ValidationError`] when the
/// target is a category or the value is negative or non-finite.
pub fn apply_price_edit(
    project: &Project,
    item_id: &str,
    edit: PriceEdit,
) -> Result<Project, EngineError> {
    let field = match edit {
        PriceEdit::NoOverhead(_) => "unit_price_no_overhead",
        PriceEdit::WithOverhead(_) => "unit_price_with_overhead",
        PriceEdit::Total(_) => "contract_total",
        PriceEdit::Quantity(_) => "contract_quantity",
    };
    let value = match edit {
        PriceEdit::NoOverhead(v)
        | PriceEdit::WithOverhead(v)
        | PriceEdit::Total(v)
        | PriceEdit::Quantity(v) => v,
    };
    let (index, item) = priced_item(project, item_id, field)?;
    check_value(item_id, field, value, false)?;

    let draft = PriceDraft::from_item(item, project.overhead_index).apply(edit);
    let mut next = project.clone();
    next.items[index] = draft.commit(item);
    Ok(next)
}

/// Record progress for the open period on one item.
///
/// | entered        | stored                                                     |
/// |----------------|------------------------------------------------------------|
/// | quantity `q`   | `current_quantity = q`, `current_total = r(price × q)`     |
/// | percentage `p` | `q = r(contract_quantity × p / 100)`, then as quantity     |
/// | total `v`      | `current_total = v`, `current_quantity = r(v / price)`     |
///
/// `price` is the overhead-adjusted unit price. With a zero price a total
/// leaves the quantity unchanged. Negative values are accepted as
/// corrections of earlier over-measurement.
///
/// # Errors
///
/// Returns [`EngineError::ItemNotFound`], or a [`ValidationError`] when the
/// target is a category or the value is non-finite.
pub fn apply_measurement(
    project: &Project,
    item_id: &str,
    edit: MeasureEdit,
) -> Result<Project, EngineError> {
    let (index, item) = priced_item(project, item_id, edit.field())?;
    check_value(item_id, edit.field(), edit.value(), true)?;

    let price = item.figures(project.overhead_index).unit_price_with_overhead;
    let (current_quantity, current_total) = match edit {
        MeasureEdit::Quantity(q) => (q, round2(price * q)),
        MeasureEdit::Percentage(p) => {
            let q = round2(item.contract_quantity * p / 100.0);
            (q, round2(price * q))
        }
        MeasureEdit::Total(v) => {
            let q = if price > 0.0 {
                round2(ratio(v, price))
            } else {
                item.current_quantity
            };
            (q, v)
        }
    };

    let mut next = project.clone();
    next.items[index] = WorkItem {
        current_quantity,
        current_total,
        ..item.clone()
    };
    Ok(next)
}

/// Change the project overhead index. Every item is repriced from its base
/// price.
///
/// # Errors
///
/// Returns a [`ValidationError`] for a negative or non-finite index.
pub fn set_overhead_index(project: &Project, overhead_index: f64) -> Result<Project, EngineError> {
    check_value(&project.name, "overhead_index", overhead_index, false)?;
    let items = project
        .items
        .iter()
        .map(|item| WorkItem {
            unit_price_with_overhead: None,
            contract_total: None,
            ..item.clone()
        })
        .collect();
    Ok(Project {
        overhead_index,
        items,
        ..project.clone()
    })
}

/// Replace the project-level contract and current total overrides.
///
/// # Errors
///
/// Returns a [`ValidationError`] for a negative or non-finite override.
pub fn set_overrides(
    project: &Project,
    contract_total: Option<f64>,
    current_total: Option<f64>,
) -> Result<Project, EngineError> {
    if let Some(v) = contract_total {
        check_value(&project.name, "contract_total_override", v, false)?;
    }
    if let Some(v) = current_total {
        check_value(&project.name, "current_total_override", v, false)?;
    }
    Ok(Project {
        contract_total_override: contract_total,
        current_total_override: current_total,
        ..project.clone()
    })
}

/// Replace the billing deduction percentages.
///
/// # Errors
///
/// Returns a [`ValidationError`] for a negative or non-finite percentage.
pub fn set_deductions(
    project: &Project,
    discount_percent: Option<f64>,
    iss_percent: Option<f64>,
) -> Result<Project, EngineError> {
    if let Some(v) = discount_percent {
        check_value(&project.name, "discount_percent", v, false)?;
    }
    if let Some(v) = iss_percent {
        check_value(&project.name, "iss_percent", v, false)?;
    }
    Ok(Project {
        discount_percent,
        iss_percent,
        ..project.clone()
    })
}

/// Move an item (and its subtree) under a new parent, or to the root level.
///
/// `order` defaults to the end of the new sibling list.
///
/// # Errors
///
/// Returns [`EngineError::ItemNotFound`], or a [`ValidationError`] if the
/// parent is missing, not a category, or inside the moved subtree.
pub fn move_item(
    project: &Project,
    item_id: &str,
    new_parent_id: Option<&str>,
    order: Option<i64>,
) -> Result<Project, EngineError> {
    validate_reparent(&project.items, item_id, new_parent_id)?;

    let order = order.unwrap_or_else(|| {
        next_order_among(project.items.iter().filter(|i| i.id != item_id), new_parent_id)
    });

    let mut next = project.clone();
    for item in &mut next.items {
        if item.id == item_id {
            item.parent_id = new_parent_id.map(str::to_string);
            item.order = order;
        }
    }
    Ok(next)
}

/// Delete an item, its whole subtree, and responsibilities assigned to them.
///
/// Returns the new project and the plan that was executed.
///
/// # Errors
///
/// Returns [`EngineError::ItemNotFound`] if `item_id` does not exist.
pub fn remove_subtree(
    project: &Project,
    item_id: &str,
) -> Result<(Project, CascadePlan), EngineError> {
    if project.item(item_id).is_none() {
        return Err(EngineError::ItemNotFound(item_id.to_string()));
    }

    let plan = plan_cascade_delete(&project.items, &project.responsibilities, item_id);
    let mut next = project.clone();
    next.items.retain(|i| !plan.removes_node(&i.id));
    next.responsibilities.retain(|r| !plan.removes_reference(&r.id));

    tracing::debug!(
        target_id = item_id,
        items = plan.node_ids.len(),
        responsibilities = plan.reference_ids.len(),
        "removed subtree"
    );

    Ok((next, plan))
}

/// Attach a responsibility to an existing work item.
///
/// # Errors
///
/// Returns [`EngineError::ItemNotFound`] for an unknown work item and
/// [`ValidationError::DuplicateId`] for a reused responsibility id.
pub fn assign(project: &Project, responsibility: Responsibility) -> Result<Project, EngineError> {
    if project.item(&responsibility.work_item_id).is_none() {
        return Err(EngineError::ItemNotFound(responsibility.work_item_id));
    }
    if project
        .responsibilities
        .iter()
        .any(|r| r.id == responsibility.id)
    {
        return Err(ValidationError::DuplicateId(responsibility.id).into());
    }

    let mut next = project.clone();
    next.responsibilities.push(responsibility);
    Ok(next)
}

/// Record a supply forecast and post its ledger entry.
///
/// # Errors
///
/// Returns a [`ValidationError`] for a reused forecast id or a negative or
/// non-finite quantity or unit price.
pub fn record_forecast(
    project: &Project,
    forecast: SupplyForecast,
    category: Option<&str>,
    config: &LedgerConfig,
) -> Result<Project, EngineError> {
    check_value(&forecast.id, "quantity", forecast.quantity, false)?;
    check_value(&forecast.id, "unit_price", forecast.unit_price, false)?;
    if project.forecasts.iter().any(|f| f.id == forecast.id) {
        return Err(ValidationError::DuplicateId(forecast.id).into());
    }

    let entry = forecast_to_ledger(&forecast, category, config);
    let mut next = project.clone();
    next.forecasts.push(forecast);
    next.ledger.push(entry);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PaymentState;

    fn sample() -> Project {
        let mut p = Project::new("Clinic", 20.0);
        p.items = vec![
            WorkItem::category("c1", "Structure"),
            WorkItem::item("i1", "Slab", 10.0, 50.0).with_parent("c1"),
            WorkItem::category("c2", "Finishes").with_order(1),
            WorkItem::item("i2", "Paint", 100.0, 10.0).with_parent("c2"),
        ];
        p.responsibilities = vec![Responsibility {
            id: "r1".to_string(),
            work_item_id: "i2".to_string(),
            name: "Ana".to_string(),
            role: "foreman".to_string(),
        }];
        p
    }

    fn record(id: &str, parent: Option<&str>, item_type: ItemType) -> WorkItemRecord {
        WorkItemRecord {
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
            item_type: Some(item_type),
            contract_quantity: (item_type == ItemType::Item).then_some(2.0),
            unit_price_no_overhead: (item_type == ItemType::Item).then_some(5.0),
            ..WorkItemRecord::default()
        }
    }

    // --- add ---

    #[test]
    fn add_item_under_category() {
        let p = add_item(&sample(), record("i3", Some("c1"), ItemType::Item)).unwrap();
        assert_eq!(p.item("i3").unwrap().parent_id.as_deref(), Some("c1"));
        assert_eq!(p.items.len(), 5);
    }

    #[test]
    fn add_rejects_duplicate_and_bad_parent() {
        let p = sample();
        assert_eq!(
            add_item(&p, record("i1", None, ItemType::Item)).unwrap_err().code(),
            crate::error::ErrorCode::DuplicateId
        );
        assert_eq!(
            add_item(&p, record("x", Some("i1"), ItemType::Item)).unwrap_err().code(),
            crate::error::ErrorCode::ParentNotCategory
        );
        assert_eq!(
            add_item(&p, record("x", Some("nope"), ItemType::Category)).unwrap_err().code(),
            crate::error::ErrorCode::ItemNotFound
        );
    }

    #[test]
    fn next_order_appends_to_siblings() {
        let p = sample();
        assert_eq!(next_order(&p, None), 2);
        assert_eq!(next_order(&p, Some("c1")), 1);
        assert_eq!(next_order(&p, Some("i1")), 0);
    }

    // --- pricing ---

    #[test]
    fn price_edit_with_overhead_stores_base_price() {
        let p = apply_price_edit(&sample(), "i1", PriceEdit::WithOverhead(72.0)).unwrap();
        let item = p.item("i1").unwrap();
        assert_eq!(item.unit_price_no_overhead, 60.0);
        assert_eq!(item.figures(p.overhead_index).contract_total, 720.0);
    }

    #[test]
    fn price_edit_by_total_reads_back_exactly() {
        let mut p = sample();
        p.items[1].contract_quantity = 3.0;

        let p = apply_price_edit(&p, "i1", PriceEdit::WithOverhead(333.33)).unwrap();
        let f = p.item("i1").unwrap().figures(p.overhead_index);
        assert_eq!(f.unit_price_with_overhead, 333.33);
        assert_eq!(f.contract_total, 999.99);

        let p = apply_price_edit(&p, "i1", PriceEdit::Total(1000.0)).unwrap();
        let f = p.item("i1").unwrap().figures(p.overhead_index);
        assert_eq!(f.unit_price_with_overhead, 333.33);
        assert_eq!(f.contract_total, 1000.0);
        assert_eq!(p.stats().contract_total, 2200.0);
    }

    #[test]
    fn price_edit_on_category_is_rejected() {
        let err = apply_price_edit(&sample(), "c1", PriceEdit::NoOverhead(1.0)).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::CategoryHasPricing {
                item_id: "c1".to_string(),
                field: "unit_price_no_overhead",
            })
        );
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = apply_price_edit(&sample(), "i1", PriceEdit::Total(-5.0)).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidRecord);
    }

    // --- measurement ---

    #[test]
    fn measure_by_quantity() {
        let p = apply_measurement(&sample(), "i1", MeasureEdit::Quantity(5.0)).unwrap();
        let item = p.item("i1").unwrap();
        assert_eq!(item.current_quantity, 5.0);
        assert_eq!(item.current_total, 300.0);
    }

    #[test]
    fn measure_by_percentage() {
        let p = apply_measurement(&sample(), "i2", MeasureEdit::Percentage(25.0)).unwrap();
        let item = p.item("i2").unwrap();
        assert_eq!(item.current_quantity, 25.0);
        assert_eq!(item.current_total, 300.0);
    }

    #[test]
    fn measure_by_total() {
        let p = apply_measurement(&sample(), "i1", MeasureEdit::Total(150.0)).unwrap();
        let item = p.item("i1").unwrap();
        assert_eq!(item.current_quantity, 2.5);
        assert_eq!(item.current_total, 150.0);
    }

    #[test]
    fn measure_total_with_zero_price_keeps_quantity() {
        let mut p = sample();
        p.items[1].unit_price_no_overhead = 0.0;
        p.items[1].current_quantity = 3.0;
        let p = apply_measurement(&p, "i1", MeasureEdit::Total(10.0)).unwrap();
        let item = p.item("i1").unwrap();
        assert_eq!(item.current_quantity, 3.0);
        assert_eq!(item.current_total, 10.0);
    }

    #[test]
    fn measure_accepts_negative_corrections() {
        let p = apply_measurement(&sample(), "i1", MeasureEdit::Quantity(-1.0)).unwrap();
        assert_eq!(p.item("i1").unwrap().current_total, -60.0);
    }

    #[test]
    fn measure_rejects_non_finite() {
        let err = apply_measurement(&sample(), "i1", MeasureEdit::Quantity(f64::NAN))
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidRecord);
    }

    // --- overhead and overrides ---

    #[test]
    fn overhead_change_reprices_everything() {
        let p = apply_price_edit(&sample(), "i1", PriceEdit::Total(700.0)).unwrap();
        let p = set_overhead_index(&p, 0.0).unwrap();
        assert_eq!(p.item("i1").unwrap().contract_total, None);
        assert_eq!(p.stats().contract_total, 1583.3);
        assert!(set_overhead_index(&p, -1.0).is_err());
    }

    #[test]
    fn overrides_and_deductions_are_replaced() {
        let p = set_overrides(&sample(), Some(2000.0), None).unwrap();
        assert_eq!(p.stats().contract_total, 2000.0);
        let p = set_deductions(&p, Some(10.0), Some(5.0)).unwrap();
        assert_eq!(p.discount_percent, Some(10.0));
        let p = set_overrides(&p, None, None).unwrap();
        assert_eq!(p.stats().contract_total, 1800.0);
    }

    // --- move ---

    #[test]
    fn move_item_to_other_category() {
        let p = move_item(&sample(), "i1", Some("c2"), None).unwrap();
        let item = p.item("i1").unwrap();
        assert_eq!(item.parent_id.as_deref(), Some("c2"));
        assert_eq!(item.order, 1);
    }

    #[test]
    fn move_category_into_itself_is_rejected() {
        let err = move_item(&sample(), "c1", Some("c1"), None).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::CycleDetected);
    }

    #[test]
    fn move_to_root_with_explicit_order() {
        let p = move_item(&sample(), "i2", None, Some(7)).unwrap();
        let item = p.item("i2").unwrap();
        assert!(item.parent_id.is_none());
        assert_eq!(item.order, 7);
    }

    // --- delete ---

    #[test]
    fn remove_subtree_cascades_to_responsibilities() {
        let (p, plan) = remove_subtree(&sample(), "c2").unwrap();
        assert!(plan.removes_node("i2"));
        assert!(p.item("c2").is_none());
        assert!(p.item("i2").is_none());
        assert!(p.responsibilities.is_empty());
        assert_eq!(p.items.len(), 2);
    }

    #[test]
    fn remove_missing_item_fails() {
        assert_eq!(
            remove_subtree(&sample(), "zz").unwrap_err(),
            EngineError::ItemNotFound("zz".to_string())
        );
    }

    // --- assignments and forecasts ---

    #[test]
    fn assign_requires_existing_item() {
        let r = Responsibility {
            id: "r2".to_string(),
            work_item_id: "missing".to_string(),
            name: "Bo".to_string(),
            role: String::new(),
        };
        assert!(assign(&sample(), r.clone()).is_err());

        let ok = assign(&sample(), Responsibility {
            work_item_id: "i1".to_string(),
            ..r
        })
        .unwrap();
        assert_eq!(ok.responsibilities.len(), 2);
    }

    #[test]
    fn record_forecast_posts_ledger_entry() {
        let forecast = SupplyForecast {
            id: "fc-1".to_string(),
            description: "Rebar".to_string(),
            quantity: 4.0,
            unit_price: 12.5,
            payment_state: PaymentState::Overdue,
        };
        let config = LedgerConfig::default();
        let p = record_forecast(&sample(), forecast.clone(), None, &config).unwrap();
        assert_eq!(p.forecasts.len(), 1);
        assert_eq!(p.ledger[0].amount, 50.0);
        assert_eq!(p.ledger[0].category, "Materials");
        assert_eq!(p.ledger[0].payment_state, PaymentState::Overdue);

        assert!(record_forecast(&p, forecast, None, &config).is_err());
    }
}
