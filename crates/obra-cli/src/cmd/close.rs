//! `obra close` — close the open measurement and start the next one.
//!
//! The open period's items, totals, and billing are frozen into a snapshot.
//! Every item's accumulated figures become its previous figures and the
//! current figures are cleared.

use crate::cmd::apply;
use crate::cmd::show::{write_billing, write_stats};
use crate::output::{OutputMode, pretty_kv, pretty_section, render};
use chrono::{Local, NaiveDate};
use clap::Args;
use obra_core::model::BillingSummary;
use obra_core::period::close_period;
use obra_core::tree::AggregateStats;
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Closing date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct CloseOutput {
    closed_measurement: u32,
    date: NaiveDate,
    open_measurement: u32,
    stats: AggregateStats,
    billing: BillingSummary,
}

pub fn run_close(args: &CloseArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());

    let result = apply(project_root, output, |project| {
        let next = close_period(project, date)?;
        let result = next
            .latest_snapshot()
            .map(|s| CloseOutput {
                closed_measurement: s.measurement_number,
                date: s.date,
                open_measurement: next.measurement_number,
                stats: s.stats,
                billing: s.billing,
            })
            .ok_or(obra_core::PreconditionError::NoClosedPeriod)?;
        Ok((next, result))
    })?;

    tracing::info!(
        measurement = result.closed_measurement,
        %date,
        current_total = result.stats.current_total,
        "closed measurement"
    );

    render(output, &result, |r, w| {
        pretty_section(
            w,
            &format!("✓ Closed measurement {} on {}", r.closed_measurement, r.date),
        )?;
        write_stats(w, &r.stats)?;
        writeln!(w)?;
        write_billing(w, &r.billing)?;
        writeln!(w)?;
        pretty_kv(w, "Now open", r.open_measurement.to_string())
    })
}
