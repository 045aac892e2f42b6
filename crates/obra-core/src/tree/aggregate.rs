//! WBS labels, bottom-up category totals, and display flattening.
//!
//! [`aggregate`] walks the pre-order once in reverse to compute each node's
//! totals, children before parents, then emits rows in display order. A
//! category's totals are the sum over every item beneath it at any depth;
//! categories never contribute figures of their own.

use serde::{Deserialize, Serialize};

use super::build::Forest;
use crate::model::item::{ItemType, WorkItem};
use crate::money::{percent, round2};

/// One display row: a work item with every computed field filled in.
///
/// Quantity and price columns are `None` on category rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WbsRow {
    pub id: String,
    pub parent_id: Option<String>,
    pub item_type: ItemType,
    pub wbs: String,
    pub depth: usize,
    pub description: String,
    pub unit: String,
    pub source_code: String,
    pub contract_quantity: Option<f64>,
    pub unit_price_no_overhead: Option<f64>,
    pub unit_price_with_overhead: Option<f64>,
    pub contract_total: f64,
    pub previous_quantity: Option<f64>,
    pub previous_total: f64,
    pub current_quantity: Option<f64>,
    pub current_total: f64,
    pub current_percentage: f64,
    pub accumulated_quantity: Option<f64>,
    pub accumulated_total: f64,
    pub accumulated_percentage: f64,
    pub balance_quantity: Option<f64>,
    pub balance_total: f64,
}

/// Project-wide totals consumed verbatim by presentation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub contract_total: f64,
    pub previous_total: f64,
    pub current_total: f64,
    pub accumulated_total: f64,
    pub balance_total: f64,
    pub progress_percent: f64,
}

impl AggregateStats {
    fn from_totals(totals: Totals) -> Self {
        Self {
            contract_total: totals.contract,
            previous_total: totals.previous,
            current_total: totals.current,
            accumulated_total: totals.accumulated,
            balance_total: totals.balance,
            progress_percent: percent(totals.accumulated, totals.contract),
        }
    }

    /// Replace computed totals with explicitly set project values.
    ///
    /// The current-period override feeds the accumulated total; balance and
    /// progress are recomputed from the effective figures.
    #[must_use]
    pub fn with_overrides(self, contract_total: Option<f64>, current_total: Option<f64>) -> Self {
        if contract_total.is_none() && current_total.is_none() {
            return self;
        }
        let contract = contract_total.unwrap_or(self.contract_total);
        let current = current_total.unwrap_or(self.current_total);
        let accumulated = round2(self.previous_total + current);
        Self {
            contract_total: contract,
            previous_total: self.previous_total,
            current_total: current,
            accumulated_total: accumulated,
            balance_total: round2(contract - accumulated),
            progress_percent: percent(accumulated, contract),
        }
    }
}

/// Output of [`aggregate`]: rows in display order plus project-wide stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WbsReport {
    pub rows: Vec<WbsRow>,
    pub stats: AggregateStats,
}

impl WbsReport {
    /// Look up a row by work item id.
    #[must_use]
    pub fn row(&self, id: &str) -> Option<&WbsRow> {
        self.rows.iter().find(|r| r.id == id)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Totals {
    contract: f64,
    previous: f64,
    current: f64,
    accumulated: f64,
    balance: f64,
}

impl Totals {
    fn add(self, other: Self) -> Self {
        Self {
            contract: round2(self.contract + other.contract),
            previous: round2(self.previous + other.previous),
            current: round2(self.current + other.current),
            accumulated: round2(self.accumulated + other.accumulated),
            balance: round2(self.balance + other.balance),
        }
    }
}

/// Build the forest for `items`, compute labels and totals, and flatten it.
#[must_use]
pub fn aggregate(items: &[WorkItem], overhead_index: f64) -> WbsReport {
    let forest = Forest::build(items);
    let visits = forest.preorder();
    let mut subtree = vec![Totals::default(); items.len()];
    for visit in visits.iter().rev() {
        let totals = node_totals(&forest, items, overhead_index, visit.index, &subtree);
        subtree[visit.index] = totals;
    }

    let stats_totals = forest
        .roots()
        .iter()
        .fold(Totals::default(), |acc, &r| acc.add(subtree[r]));

    let rows = visits
        .into_iter()
        .map(|visit| {
            let item = &items[visit.index];
            make_row(item, visit.wbs, visit.depth, subtree[visit.index], overhead_index)
        })
        .collect();

    WbsReport {
        rows,
        stats: AggregateStats::from_totals(stats_totals),
    }
}

/// Children's totals in display order, then the node's own contribution.
/// Every child must already be summed into `subtree`.
fn node_totals(
    forest: &Forest,
    items: &[WorkItem],
    overhead_index: f64,
    index: usize,
    subtree: &[Totals],
) -> Totals {
    let mut totals = forest
        .children(index)
        .iter()
        .fold(Totals::default(), |acc, &child| acc.add(subtree[child]));

    let item = &items[index];
    if item.item_type == ItemType::Item {
        let f = item.figures(overhead_index);
        totals = totals.add(Totals {
            contract: f.contract_total,
            previous: item.previous_total,
            current: item.current_total,
            accumulated: f.accumulated_total,
            balance: f.balance_total,
        });
    }

    totals
}

fn make_row(
    item: &WorkItem,
    wbs: String,
    depth: usize,
    totals: Totals,
    overhead_index: f64,
) -> WbsRow {
    let base = WbsRow {
        id: item.id.clone(),
        parent_id: item.parent_id.clone(),
        item_type: item.item_type,
        wbs,
        depth,
        description: item.description.clone(),
        unit: item.unit.clone(),
        source_code: item.source_code.clone(),
        contract_quantity: None,
        unit_price_no_overhead: None,
        unit_price_with_overhead: None,
        contract_total: totals.contract,
        previous_quantity: None,
        previous_total: totals.previous,
        current_quantity: None,
        current_total: totals.current,
        current_percentage: percent(totals.current, totals.contract),
        accumulated_quantity: None,
        accumulated_total: totals.accumulated,
        accumulated_percentage: percent(totals.accumulated, totals.contract),
        balance_quantity: None,
        balance_total: totals.balance,
    };

    match item.item_type {
        ItemType::Category => base,
        ItemType::Item => {
            let f = item.figures(overhead_index);
            WbsRow {
                contract_quantity: Some(item.contract_quantity),
                unit_price_no_overhead: Some(item.unit_price_no_overhead),
                unit_price_with_overhead: Some(f.unit_price_with_overhead),
                contract_total: f.contract_total,
                previous_quantity: Some(item.previous_quantity),
                previous_total: item.previous_total,
                current_quantity: Some(item.current_quantity),
                current_total: item.current_total,
                current_percentage: f.current_percentage,
                accumulated_quantity: Some(f.accumulated_quantity),
                accumulated_total: f.accumulated_total,
                accumulated_percentage: f.accumulated_percentage,
                balance_quantity: Some(f.balance_quantity),
                balance_total: f.balance_total,
                ..base
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_item_category() -> Vec<WorkItem> {
        vec![
            WorkItem::category("cat", "Structure"),
            WorkItem::item("i1", "Columns", 10.0, 50.0).with_parent("cat"),
            WorkItem::item("i2", "Beams", 10.0, 50.0)
                .with_parent("cat")
                .with_order(1),
        ]
    }

    #[test]
    fn category_sums_item_contract_totals() {
        let report = aggregate(&two_item_category(), 20.0);
        let cat = report.row("cat").unwrap();
        let i1 = report.row("i1").unwrap();

        assert_eq!(i1.unit_price_with_overhead, Some(60.0));
        assert_eq!(i1.contract_total, 600.0);
        assert_eq!(cat.contract_total, 1200.0);
        assert_eq!(cat.contract_quantity, None);
        assert_eq!(report.stats.contract_total, 1200.0);
    }

    #[test]
    fn labels_follow_position() {
        let report = aggregate(&two_item_category(), 20.0);
        let labels: Vec<_> = report.rows.iter().map(|r| r.wbs.as_str()).collect();
        assert_eq!(labels, vec!["1", "1.1", "1.2"]);
    }

    #[test]
    fn nested_categories_roll_up_through_every_level() {
        let items = vec![
            WorkItem::category("a", "A"),
            WorkItem::category("b", "B").with_parent("a"),
            WorkItem::item("x", "X", 2.0, 100.0).with_parent("b"),
            WorkItem::item("y", "Y", 1.0, 30.0).with_parent("a").with_order(1),
        ];
        let report = aggregate(&items, 0.0);
        assert_eq!(report.row("b").unwrap().contract_total, 200.0);
        assert_eq!(report.row("a").unwrap().contract_total, 230.0);
        assert_eq!(report.row("y").unwrap().wbs, "1.2");
        assert_eq!(report.row("x").unwrap().wbs, "1.1.1");
        assert_eq!(report.row("x").unwrap().depth, 2);
    }

    #[test]
    fn empty_category_is_all_zero() {
        let report = aggregate(&[WorkItem::category("empty", "Nothing yet")], 15.0);
        let row = report.row("empty").unwrap();
        assert_eq!(row.contract_total, 0.0);
        assert_eq!(row.accumulated_total, 0.0);
        assert_eq!(row.accumulated_percentage, 0.0);
        assert_eq!(row.current_percentage, 0.0);
        assert!(row.balance_total.is_finite());
        assert_eq!(report.stats.progress_percent, 0.0);
    }

    #[test]
    fn category_percentage_uses_totals() {
        let mut items = two_item_category();
        items[1].previous_total = 300.0;
        items[1].previous_quantity = 5.0;
        items[2].current_total = 300.0;
        items[2].current_quantity = 5.0;

        let report = aggregate(&items, 20.0);
        let cat = report.row("cat").unwrap();
        assert_eq!(cat.previous_total, 300.0);
        assert_eq!(cat.current_total, 300.0);
        assert_eq!(cat.accumulated_total, 600.0);
        assert_eq!(cat.balance_total, 600.0);
        assert_eq!(cat.accumulated_percentage, 50.0);
        assert_eq!(cat.current_percentage, 25.0);
        assert_eq!(report.stats.progress_percent, 50.0);
    }

    #[test]
    fn flatten_places_subtree_before_next_sibling() {
        let items = vec![
            WorkItem::category("b", "B").with_order(2),
            WorkItem::category("a", "A").with_order(1),
            WorkItem::item("b1", "B1", 1.0, 1.0).with_parent("b"),
            WorkItem::item("a1", "A1", 1.0, 1.0).with_parent("a"),
            WorkItem::category("a2", "A2").with_parent("a").with_order(1),
            WorkItem::item("a21", "A21", 1.0, 1.0).with_parent("a2"),
        ];
        let ids: Vec<_> = aggregate(&items, 0.0)
            .rows
            .iter()
            .map(|r| r.id.clone())
            .collect();
        assert_eq!(ids, vec!["a", "a1", "a2", "a21", "b", "b1"]);
    }

    #[test]
    fn deep_chain_rolls_up_to_the_root() {
        let mut items: Vec<WorkItem> = (0..10_000)
            .map(|i| {
                let node = WorkItem::category(format!("c{i}"), "Level");
                if i == 0 {
                    node
                } else {
                    node.with_parent(format!("c{}", i - 1))
                }
            })
            .collect();
        items.push(WorkItem::item("leaf", "Leaf", 3.0, 10.0).with_parent("c9999"));

        let report = aggregate(&items, 0.0);
        assert_eq!(report.row("c0").unwrap().contract_total, 30.0);
        assert_eq!(report.row("leaf").unwrap().depth, 10_000);
        assert_eq!(report.stats.contract_total, 30.0);
    }

    #[test]
    fn orphan_item_counts_in_stats_as_root() {
        let items = vec![WorkItem::item("o", "Orphan", 2.0, 10.0).with_parent("gone")];
        let report = aggregate(&items, 0.0);
        assert_eq!(report.rows[0].wbs, "1");
        assert_eq!(report.stats.contract_total, 20.0);
    }

    #[test]
    fn overrides_supersede_computed_stats() {
        let stats = AggregateStats {
            contract_total: 1000.0,
            previous_total: 200.0,
            current_total: 100.0,
            accumulated_total: 300.0,
            balance_total: 700.0,
            progress_percent: 30.0,
        };
        let effective = stats.with_overrides(Some(2000.0), Some(300.0));
        assert_eq!(effective.contract_total, 2000.0);
        assert_eq!(effective.current_total, 300.0);
        assert_eq!(effective.accumulated_total, 500.0);
        assert_eq!(effective.balance_total, 1500.0);
        assert_eq!(effective.progress_percent, 25.0);

        assert_eq!(stats.with_overrides(None, None), stats);
    }
}
