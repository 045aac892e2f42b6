//! End-to-end scenarios through the public editing and period API.

use chrono::NaiveDate;
use obra_core::edit::{MeasureEdit, add_item, apply_measurement, remove_subtree};
use obra_core::model::{ItemType, Project, WorkItem, WorkItemRecord};
use obra_core::period::{close_period, reopen_period};
use obra_core::tree::collect_descendants;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, d).expect("valid date")
}

fn category(id: &str) -> WorkItemRecord {
    WorkItemRecord {
        id: id.to_string(),
        item_type: Some(ItemType::Category),
        description: format!("Category {id}"),
        ..WorkItemRecord::default()
    }
}

fn item(id: &str, parent: &str, quantity: f64, price: f64) -> WorkItemRecord {
    WorkItemRecord {
        id: id.to_string(),
        parent_id: Some(parent.to_string()),
        item_type: Some(ItemType::Item),
        description: format!("Item {id}"),
        contract_quantity: Some(quantity),
        unit_price_no_overhead: Some(price),
        ..WorkItemRecord::default()
    }
}

fn build(records: Vec<WorkItemRecord>, overhead_index: f64) -> Project {
    records
        .into_iter()
        .try_fold(Project::new("Example", overhead_index), |p, r| add_item(&p, r))
        .expect("records are valid")
}

#[test]
fn category_of_two_items_totals_1200() {
    let project = build(
        vec![
            category("cat"),
            item("a", "cat", 10.0, 50.0),
            item("b", "cat", 10.0, 50.0),
        ],
        20.0,
    );
    let report = project.report();

    let a = report.row("a").expect("row a");
    assert_eq!(a.unit_price_with_overhead, Some(60.0));
    assert_eq!(a.contract_total, 600.0);
    assert_eq!(report.row("b").expect("row b").contract_total, 600.0);
    assert_eq!(report.row("cat").expect("row cat").contract_total, 1200.0);
    assert_eq!(report.stats.contract_total, 1200.0);

    let labels: Vec<_> = report.rows.iter().map(|r| r.wbs.as_str()).collect();
    assert_eq!(labels, vec!["1", "1.1", "1.2"]);
}

#[test]
fn two_half_measurements_complete_the_item() {
    let project = build(vec![category("cat"), item("i", "cat", 10.0, 50.0)], 20.0);

    let first = apply_measurement(&project, "i", MeasureEdit::Quantity(5.0)).expect("measure");
    let closed = close_period(&first, day(1)).expect("close 1");
    let figures = closed.item("i").expect("item").figures(20.0);
    assert_eq!(figures.accumulated_quantity, 5.0);
    assert_eq!(figures.accumulated_percentage, 50.0);

    let second = apply_measurement(&closed, "i", MeasureEdit::Quantity(5.0)).expect("measure");
    let closed = close_period(&second, day(30)).expect("close 2");
    let done = closed.item("i").expect("item");
    let figures = done.figures(20.0);
    assert_eq!(done.previous_quantity, 10.0);
    assert_eq!(figures.accumulated_quantity, 10.0);
    assert_eq!(figures.accumulated_percentage, 100.0);
    assert_eq!(closed.measurement_number, 3);
    assert_eq!(closed.stats().progress_percent, 100.0);
}

#[test]
fn reopen_returns_to_pre_close_state() {
    let project = build(vec![category("cat"), item("i", "cat", 8.0, 25.0)], 10.0);
    let measured =
        apply_measurement(&project, "i", MeasureEdit::Percentage(50.0)).expect("measure");
    let closed = close_period(&measured, day(15)).expect("close");
    let reopened = reopen_period(&closed, 1).expect("reopen");
    assert_eq!(reopened, measured);
}

#[test]
fn chain_collector_returns_target_and_below() {
    let items = vec![
        WorkItem::category("A", "A"),
        WorkItem::category("B", "B").with_parent("A"),
        WorkItem::category("C", "C").with_parent("B"),
        WorkItem::category("D", "D").with_parent("C"),
    ];
    let found: Vec<_> = collect_descendants(&items, "B").into_iter().collect();
    assert_eq!(found, vec!["B", "C", "D"]);
}

#[test]
fn deleting_a_category_reaggregates_the_parent() {
    let project = build(
        vec![
            category("root"),
            WorkItemRecord {
                parent_id: Some("root".to_string()),
                ..category("sub")
            },
            item("x", "sub", 1.0, 100.0),
            item("y", "root", 2.0, 100.0),
        ],
        0.0,
    );
    assert_eq!(project.stats().contract_total, 300.0);

    let (after, plan) = remove_subtree(&project, "sub").expect("delete");
    assert_eq!(plan.node_ids.len(), 2);
    assert_eq!(after.report().row("root").expect("root row").contract_total, 200.0);
}

#[test]
fn project_survives_json_persistence() {
    let project = build(vec![category("cat"), item("i", "cat", 3.0, 33.33)], 17.5);
    let measured = apply_measurement(&project, "i", MeasureEdit::Total(50.0)).expect("measure");
    let closed = close_period(&measured, day(5)).expect("close");

    let json = serde_json::to_string_pretty(&closed).expect("serialize");
    let loaded: Project = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(loaded, closed);
}
