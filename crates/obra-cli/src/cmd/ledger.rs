//! `obra ledger` — list ledger entries with totals per payment state.

use crate::cmd::load_project;
use crate::output::{OutputMode, amount, pretty_kv, pretty_section, render_mode};
use clap::Args;
use obra_core::ledger::{LedgerEntry, PaymentState};
use obra_core::money::round2;
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Only show entries in this payment state.
    #[arg(long)]
    pub state: Option<PaymentState>,

    /// Only show entries in this category.
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct Totals {
    pending: f64,
    paid: f64,
    overdue: f64,
    total: f64,
}

#[derive(Debug, Serialize)]
struct LedgerOutput {
    entries: Vec<LedgerEntry>,
    totals: Totals,
}

fn totals(entries: &[LedgerEntry]) -> Totals {
    let sum = |state: PaymentState| {
        round2(
            entries
                .iter()
                .filter(|e| e.payment_state == state)
                .map(|e| e.amount)
                .sum(),
        )
    };
    Totals {
        pending: sum(PaymentState::Pending),
        paid: sum(PaymentState::Paid),
        overdue: sum(PaymentState::Overdue),
        total: round2(entries.iter().map(|e| e.amount).sum()),
    }
}

pub fn run_ledger(
    args: &LedgerArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = load_project(project_root, output)?;
    let entries: Vec<LedgerEntry> = project
        .ledger
        .into_iter()
        .filter(|e| args.state.is_none_or(|s| e.payment_state == s))
        .filter(|e| {
            args.category
                .as_deref()
                .is_none_or(|c| e.category.eq_ignore_ascii_case(c))
        })
        .collect();
    let result = LedgerOutput {
        totals: totals(&entries),
        entries,
    };

    render_mode(
        output,
        &result,
        |r, w| {
            writeln!(w, "description\tcategory\tamount\tstate\tforecast")?;
            for e in &r.entries {
                writeln!(
                    w,
                    "{}\t{}\t{:.2}\t{}\t{}",
                    e.description,
                    e.category,
                    e.amount,
                    e.payment_state.as_str(),
                    e.source_forecast_id.as_deref().unwrap_or("")
                )?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, "Ledger")?;
            for e in &r.entries {
                writeln!(
                    w,
                    "{:<32} {:<14} {:>12}  {}",
                    e.description,
                    e.category,
                    amount(e.amount),
                    e.payment_state.as_str()
                )?;
            }
            writeln!(w)?;
            pretty_kv(w, "Pending", amount(r.totals.pending))?;
            pretty_kv(w, "Paid", amount(r.totals.paid))?;
            pretty_kv(w, "Overdue", amount(r.totals.overdue))?;
            pretty_kv(w, "Total", amount(r.totals.total))
        },
    )
}
