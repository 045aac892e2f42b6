use std::collections::HashMap;

use chrono::NaiveDate;
use obra_core::model::Project;
use obra_core::money::round2;
use obra_core::period::{close_period, reopen_period};
use obra_core::pricing::{PriceDraft, PriceEdit};
use obra_core::tree::{Forest, aggregate, collect_descendants};
use obra_core::WorkItem;
use proptest::prelude::*;

use generators::*;

const TOLERANCE: f64 = 1e-6;

fn close_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 30).expect("valid date")
}

fn project_from(items: Vec<WorkItem>, overhead_index: f64) -> Project {
    let mut project = Project::new("Generated", overhead_index);
    project.items = items;
    project
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    // Tree building

    #[test]
    fn preorder_is_a_permutation(items in arb_items()) {
        let forest = Forest::build(&items);
        let mut seen: Vec<usize> = forest.preorder().iter().map(|v| v.index).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..items.len()).collect::<Vec<_>>());
    }

    #[test]
    fn parents_precede_children(items in arb_items()) {
        let forest = Forest::build(&items);
        let visits = forest.preorder();
        let position: HashMap<usize, usize> =
            visits.iter().enumerate().map(|(pos, v)| (v.index, pos)).collect();
        let by_id: HashMap<&str, usize> =
            items.iter().enumerate().map(|(i, item)| (item.id.as_str(), i)).collect();

        for (i, item) in items.iter().enumerate() {
            let expected = item.parent_id.as_deref().map(|p| by_id[p]);
            prop_assert_eq!(forest.parent(i), expected);
            if let Some(p) = expected {
                prop_assert!(position[&p] < position[&i]);
            }
        }

        for visit in &visits {
            if let Some(p) = forest.parent(visit.index) {
                let parent_wbs = &visits[position[&p]].wbs;
                let parent_prefix = format!("{parent_wbs}.");
                prop_assert!(visit.wbs.starts_with(&parent_prefix));
                prop_assert_eq!(visit.depth, visits[position[&p]].depth + 1);
            }
        }
    }

    #[test]
    fn siblings_follow_order_then_input_position(items in arb_items()) {
        let forest = Forest::build(&items);
        let check = |siblings: &[usize]| {
            siblings
                .windows(2)
                .all(|w| (items[w[0]].order, w[0]) < (items[w[1]].order, w[1]))
        };
        prop_assert!(check(forest.roots()));
        for i in 0..items.len() {
            prop_assert!(check(forest.children(i)));
        }
    }

    // Aggregation

    #[test]
    fn category_totals_equal_descendant_item_sums(
        items in arb_items(),
        overhead_index in arb_overhead_index(),
    ) {
        let report = aggregate(&items, overhead_index);
        for row in report.rows.iter().filter(|r| r.unit_price_no_overhead.is_none()) {
            let subtree = collect_descendants(&items, &row.id);
            let (contract, current) = items
                .iter()
                .filter(|i| !i.is_category() && subtree.contains(&i.id))
                .fold((0.0, 0.0), |(c, cur), i| {
                    (c + i.figures(overhead_index).contract_total, cur + i.current_total)
                });
            prop_assert!((row.contract_total - round2(contract)).abs() < TOLERANCE);
            prop_assert!((row.current_total - round2(current)).abs() < TOLERANCE);
        }
    }

    // Pricing

    #[test]
    fn base_price_survives_overhead_round_trip(
        v in arb_price(),
        overhead_index in arb_overhead_index(),
        quantity in 0u32..10_000,
    ) {
        let draft = PriceDraft::new(f64::from(quantity), 0.0, overhead_index)
            .set_price_no_overhead(v);
        let back = draft.set_price_with_overhead(draft.with_overhead);
        prop_assert!(
            (back.no_overhead - v).abs() <= 0.01 + TOLERANCE,
            "v={} idx={} with={} back={}",
            v,
            overhead_index,
            draft.with_overhead,
            back.no_overhead
        );
    }

    #[test]
    fn committed_prices_read_back_as_drafted(
        start in arb_price(),
        v in arb_price(),
        by_total in any::<bool>(),
        overhead_index in arb_overhead_index(),
        quantity in 0u32..100_000,
    ) {
        let item = WorkItem::item("n0", "Item", f64::from(quantity) / 100.0, start);
        let edit = if by_total { PriceEdit::Total(v) } else { PriceEdit::WithOverhead(v) };
        let draft = PriceDraft::from_item(&item, overhead_index).apply(edit);
        let committed = draft.commit(&item);
        let figures = committed.figures(overhead_index);

        prop_assert_eq!(committed.unit_price_no_overhead, draft.no_overhead);
        prop_assert_eq!(figures.unit_price_with_overhead, draft.with_overhead);
        prop_assert_eq!(figures.contract_total, draft.total);
        prop_assert_eq!(PriceDraft::from_item(&committed, overhead_index), PriceDraft {
            last_edited: None,
            ..draft
        });
    }

    // Period rollover

    #[test]
    fn close_preserves_accumulated(
        items in arb_items(),
        overhead_index in arb_overhead_index(),
    ) {
        let project = project_from(items, overhead_index);
        prop_assume!(project.items.iter().any(WorkItem::has_current_progress));

        let closed = close_period(&project, close_day()).expect("close succeeds");
        for (before, after) in project.items.iter().zip(&closed.items) {
            let b = before.figures(overhead_index);
            let a = after.figures(overhead_index);
            prop_assert_eq!(a.accumulated_quantity, b.accumulated_quantity);
            prop_assert_eq!(a.accumulated_total, b.accumulated_total);
        }
        prop_assert_eq!(closed.stats().accumulated_total, project.stats().accumulated_total);
    }

    #[test]
    fn reopen_undoes_close(
        items in arb_items(),
        overhead_index in arb_overhead_index(),
    ) {
        let project = project_from(items, overhead_index);
        prop_assume!(project.items.iter().any(WorkItem::has_current_progress));

        let closed = close_period(&project, close_day()).expect("close succeeds");
        let reopened = reopen_period(&closed, project.measurement_number).expect("reopen succeeds");
        prop_assert_eq!(reopened, project);
    }
}
