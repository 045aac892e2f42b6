//! `obra show` — WBS table, totals, and billing for a measurement.

use crate::cmd::load_project;
use crate::output::{
    CliError, OutputMode, amount, fail, pct, pretty_kv, pretty_rule, pretty_section, render_mode,
};
use clap::Args;
use obra_core::model::BillingSummary;
use obra_core::tree::hierarchy::ancestors;
use obra_core::tree::{AggregateStats, WbsRow};
use obra_core::{EngineError, ErrorCode};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Show a closed measurement instead of the open one.
    #[arg(long, short)]
    pub measurement: Option<u32>,

    /// Show a single work item with its ancestor path.
    #[arg(long, conflicts_with = "measurement")]
    pub item: Option<String>,
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    name: String,
    measurement_number: u32,
    status: &'static str,
    overhead_index: f64,
    rows: Vec<WbsRow>,
    stats: AggregateStats,
    billing: BillingSummary,
}

#[derive(Debug, Serialize)]
struct ItemOutput {
    #[serde(flatten)]
    row: WbsRow,
    /// Ancestor ids, immediate parent first.
    ancestors: Vec<String>,
    /// Descriptions from the root down to this item.
    path: Vec<String>,
}

pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = load_project(project_root, output)?;

    if let Some(ref id) = args.item {
        let report = project.report();
        let chain = ancestors(&project.items, id).map_err(|e| fail(output, (&e).into()))?;
        let row = report
            .row(id)
            .cloned()
            .ok_or_else(|| fail(output, (&EngineError::ItemNotFound(id.clone())).into()))?;
        let mut path: Vec<String> = chain.iter().rev().map(|i| i.description.clone()).collect();
        path.push(row.description.clone());
        let result = ItemOutput {
            ancestors: chain.iter().map(|i| i.id.clone()).collect(),
            path,
            row,
        };
        return render_mode(
            output,
            &result,
            |r, w| write_row_tsv(w, &r.row),
            |r, w| {
                writeln!(w, "{}", r.path.join(" › "))?;
                pretty_rule(w)?;
                write_row_detail(w, &r.row)
            },
        );
    }

    let closed = args
        .measurement
        .filter(|&n| n != 0 && n != project.measurement_number);
    let result = match closed {
        None => {
            let report = project.report();
            ShowOutput {
                name: project.name.clone(),
                measurement_number: project.measurement_number,
                status: "open",
                overhead_index: project.overhead_index,
                billing: project.billing_for(&report.stats),
                rows: report.rows,
                stats: report.stats,
            }
        }
        Some(n) => {
            let (snapshot, report) = project
                .snapshot(n)
                .zip(project.snapshot_report(n))
                .ok_or_else(|| {
                    fail(
                        output,
                        CliError::with_details(
                            format!("measurement {n} not found"),
                            "Run `obra history` to list closed measurements.",
                            ErrorCode::NoClosedPeriod.code(),
                        ),
                    )
                })?;
            ShowOutput {
                name: project.name.clone(),
                measurement_number: n,
                status: "closed",
                overhead_index: snapshot.overhead_index,
                billing: snapshot.billing,
                rows: report.rows,
                stats: report.stats,
            }
        }
    };

    render_mode(output, &result, write_show_text, write_show_pretty)
}

fn write_show_text(r: &ShowOutput, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "wbs\tid\ttype\tdescription\tunit\tquantity\tunit_price\tcontract_total\tcurrent_total\taccumulated_pct\tbalance_total"
    )?;
    for row in &r.rows {
        write_row_tsv(w, row)?;
    }
    writeln!(
        w,
        "total\t\t\t\t\t\t\t{:.2}\t{:.2}\t{:.2}\t{:.2}",
        r.stats.contract_total,
        r.stats.current_total,
        r.stats.progress_percent,
        r.stats.balance_total
    )
}

fn write_show_pretty(r: &ShowOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!("{} — measurement {} ({})", r.name, r.measurement_number, r.status),
    )?;
    writeln!(
        w,
        "{:<8} {:<28} {:>5} {:>9} {:>10} {:>12} {:>11} {:>8} {:>12}",
        "WBS", "Description", "Unit", "Qty", "Price+OH", "Total", "Current", "Accum", "Balance"
    )?;
    for row in &r.rows {
        let label = format!("{}{}", "  ".repeat(row.depth), row.description);
        writeln!(
            w,
            "{:<8} {:<28} {:>5} {:>9} {:>10} {:>12} {:>11} {:>8} {:>12}",
            row.wbs,
            truncate(&label, 28),
            truncate(&row.unit, 5),
            row.contract_quantity.map(amount).unwrap_or_default(),
            row.unit_price_with_overhead.map(amount).unwrap_or_default(),
            amount(row.contract_total),
            amount(row.current_total),
            pct(row.accumulated_percentage),
            amount(row.balance_total),
        )?;
    }
    writeln!(w)?;
    pretty_kv(w, "Overhead", pct(r.overhead_index))?;
    write_stats(w, &r.stats)?;
    writeln!(w)?;
    write_billing(w, &r.billing)
}

/// Totals block shared by `show` and `close`.
pub fn write_stats(w: &mut dyn Write, stats: &AggregateStats) -> io::Result<()> {
    pretty_kv(w, "Contract total", amount(stats.contract_total))?;
    pretty_kv(w, "Previous", amount(stats.previous_total))?;
    pretty_kv(w, "Current", amount(stats.current_total))?;
    pretty_kv(w, "Accumulated", amount(stats.accumulated_total))?;
    pretty_kv(w, "Balance", amount(stats.balance_total))?;
    pretty_kv(w, "Progress", pct(stats.progress_percent))
}

/// Billing block shared by `show`, `close`, and `billing`.
pub fn write_billing(w: &mut dyn Write, billing: &BillingSummary) -> io::Result<()> {
    pretty_kv(w, "Gross", amount(billing.gross))?;
    pretty_kv(w, "Discount", amount(billing.discount))?;
    pretty_kv(w, "ISS", amount(billing.iss))?;
    pretty_kv(w, "Net", amount(billing.net))
}

/// Render one row after an edit: the TSV line in text mode, a detail view in
/// pretty mode, and the row object in JSON.
pub fn render_row(output: OutputMode, row: &WbsRow, heading: &str) -> anyhow::Result<()> {
    render_mode(
        output,
        row,
        |r, w| write_row_tsv(w, r),
        |r, w| {
            writeln!(w, "✓ {heading} {} {}", r.item_type, r.id)?;
            pretty_rule(w)?;
            write_row_detail(w, r)
        },
    )
}

/// One tab-separated row, in the column order of `obra show` text output.
pub fn write_row_tsv(w: &mut dyn Write, row: &WbsRow) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}",
        row.wbs,
        row.id,
        row.item_type,
        row.description,
        row.unit,
        row.contract_quantity.map(amount).unwrap_or_default(),
        row.unit_price_with_overhead.map(amount).unwrap_or_default(),
        row.contract_total,
        row.current_total,
        row.accumulated_percentage,
        row.balance_total,
    )
}

/// Labelled detail view of one row.
pub fn write_row_detail(w: &mut dyn Write, row: &WbsRow) -> io::Result<()> {
    pretty_kv(w, "ID", &row.id)?;
    pretty_kv(w, "WBS", &row.wbs)?;
    pretty_kv(w, "Type", row.item_type.as_str())?;
    if !row.source_code.is_empty() {
        pretty_kv(w, "Source code", &row.source_code)?;
    }
    if let (Some(qty), Some(base), Some(with)) = (
        row.contract_quantity,
        row.unit_price_no_overhead,
        row.unit_price_with_overhead,
    ) {
        pretty_kv(w, "Quantity", format!("{} {}", amount(qty), row.unit))?;
        pretty_kv(w, "Unit price", amount(base))?;
        pretty_kv(w, "Price + OH", amount(with))?;
    }
    pretty_kv(w, "Contract total", amount(row.contract_total))?;
    if let Some(q) = row.current_quantity {
        pretty_kv(w, "Current qty", amount(q))?;
    }
    pretty_kv(
        w,
        "Current",
        format!("{} ({})", amount(row.current_total), pct(row.current_percentage)),
    )?;
    pretty_kv(
        w,
        "Accumulated",
        format!(
            "{} ({})",
            amount(row.accumulated_total),
            pct(row.accumulated_percentage)
        ),
    )?;
    pretty_kv(w, "Balance", amount(row.balance_total))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
