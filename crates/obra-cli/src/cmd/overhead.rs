//! `obra overhead` — change the project overhead index.

use crate::cmd::apply;
use crate::output::{OutputMode, amount, pct, pretty_kv, render};
use clap::Args;
use obra_core::edit::set_overhead_index;
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct OverheadArgs {
    /// New overhead index in percent (e.g. 25 for 25%).
    pub index: f64,
}

#[derive(Debug, Serialize)]
struct OverheadOutput {
    previous_index: f64,
    overhead_index: f64,
    previous_contract_total: f64,
    contract_total: f64,
}

pub fn run_overhead(
    args: &OverheadArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let result = apply(project_root, output, |project| {
        let next = set_overhead_index(project, args.index)?;
        let result = OverheadOutput {
            previous_index: project.overhead_index,
            overhead_index: next.overhead_index,
            previous_contract_total: project.stats().contract_total,
            contract_total: next.stats().contract_total,
        };
        Ok((next, result))
    })?;

    tracing::info!(
        from = result.previous_index,
        to = result.overhead_index,
        "changed overhead index"
    );

    render(output, &result, |r, w| {
        writeln!(w, "✓ Overhead index {} → {}", pct(r.previous_index), pct(r.overhead_index))?;
        pretty_kv(
            w,
            "Contract total",
            format!(
                "{} → {}",
                amount(r.previous_contract_total),
                amount(r.contract_total)
            ),
        )
    })
}
