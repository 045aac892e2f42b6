//! `obra delete` — remove an item, its whole subtree, and their assignments.

use crate::cmd::apply;
use crate::output::{OutputMode, amount, pretty_kv, render};
use clap::Args;
use obra_core::edit::remove_subtree;
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Work item ID. Every descendant is removed with it.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    target: String,
    removed_items: Vec<String>,
    removed_responsibilities: Vec<String>,
    contract_total: f64,
}

pub fn run_delete(
    args: &DeleteArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let result = apply(project_root, output, |project| {
        let (next, plan) = remove_subtree(project, &args.id)?;
        let result = DeleteOutput {
            target: plan.target,
            removed_items: plan.node_ids.into_iter().collect(),
            removed_responsibilities: plan.reference_ids.into_iter().collect(),
            contract_total: next.stats().contract_total,
        };
        Ok((next, result))
    })?;

    tracing::info!(
        id = %result.target,
        items = result.removed_items.len(),
        responsibilities = result.removed_responsibilities.len(),
        "deleted subtree"
    );

    render(output, &result, |r, w| {
        writeln!(
            w,
            "✓ Deleted {} ({} item(s), {} responsibility(ies))",
            r.target,
            r.removed_items.len(),
            r.removed_responsibilities.len()
        )?;
        for id in &r.removed_items {
            writeln!(w, "  - {id}")?;
        }
        pretty_kv(w, "Contract total", amount(r.contract_total))
    })
}
