//! `obra history` — list closed measurements, most recent first.

use crate::cmd::load_project;
use crate::output::{OutputMode, amount, pct, pretty_section, render_mode};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Show at most this many measurements.
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct HistoryRow {
    measurement_number: u32,
    date: NaiveDate,
    current_total: f64,
    accumulated_total: f64,
    progress_percent: f64,
    net: f64,
}

#[derive(Debug, Serialize)]
struct HistoryOutput {
    open_measurement: u32,
    closed: Vec<HistoryRow>,
}

pub fn run_history(
    args: &HistoryArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = load_project(project_root, output)?;
    let closed = project
        .history
        .iter()
        .take(args.limit.unwrap_or(usize::MAX))
        .map(|s| HistoryRow {
            measurement_number: s.measurement_number,
            date: s.date,
            current_total: s.stats.current_total,
            accumulated_total: s.stats.accumulated_total,
            progress_percent: s.stats.progress_percent,
            net: s.billing.net,
        })
        .collect();
    let result = HistoryOutput {
        open_measurement: project.measurement_number,
        closed,
    };

    render_mode(
        output,
        &result,
        |r, w| {
            writeln!(w, "measurement\tdate\tcurrent_total\taccumulated_total\tprogress_pct\tnet")?;
            for row in &r.closed {
                writeln!(
                    w,
                    "{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}",
                    row.measurement_number,
                    row.date,
                    row.current_total,
                    row.accumulated_total,
                    row.progress_percent,
                    row.net
                )?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, &format!("Measurement {} is open", r.open_measurement))?;
            if r.closed.is_empty() {
                return writeln!(w, "No closed measurements.");
            }
            writeln!(
                w,
                "{:>4}  {:<10}  {:>12}  {:>14}  {:>8}  {:>12}",
                "#", "Date", "Current", "Accumulated", "Progress", "Net"
            )?;
            for row in &r.closed {
                writeln!(
                    w,
                    "{:>4}  {:<10}  {:>12}  {:>14}  {:>8}  {:>12}",
                    row.measurement_number,
                    row.date.to_string(),
                    amount(row.current_total),
                    amount(row.accumulated_total),
                    pct(row.progress_percent),
                    amount(row.net)
                )?;
            }
            Ok(())
        },
    )
}
