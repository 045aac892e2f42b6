//! `obra billing` — deductions and total overrides for the open period.
//!
//! With no flags, prints the current settings and the resulting billing.
//! Each flag replaces only its own setting; the `--clear-*` flags drop a pair
//! before the new values are applied.

use crate::cmd::apply;
use crate::cmd::show::{write_billing, write_stats};
use crate::output::{OutputMode, amount, pct, pretty_kv, pretty_section, render};
use clap::Args;
use obra_core::edit::{set_deductions, set_overrides};
use obra_core::model::BillingSummary;
use obra_core::tree::AggregateStats;
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct BillingArgs {
    /// Discount on the gross amount, in percent.
    #[arg(long)]
    pub discount: Option<f64>,

    /// ISS (service tax) on the discounted amount, in percent.
    #[arg(long)]
    pub iss: Option<f64>,

    /// Fixed contract total replacing the computed one.
    #[arg(long)]
    pub contract_override: Option<f64>,

    /// Fixed current-period total replacing the computed one.
    #[arg(long)]
    pub current_override: Option<f64>,

    /// Remove both deduction percentages.
    #[arg(long)]
    pub clear_deductions: bool,

    /// Remove both total overrides.
    #[arg(long)]
    pub clear_overrides: bool,
}

impl BillingArgs {
    fn changes_anything(&self) -> bool {
        self.discount.is_some()
            || self.iss.is_some()
            || self.contract_override.is_some()
            || self.current_override.is_some()
            || self.clear_deductions
            || self.clear_overrides
    }
}

#[derive(Debug, Serialize)]
struct BillingOutput {
    measurement_number: u32,
    discount_percent: Option<f64>,
    iss_percent: Option<f64>,
    contract_total_override: Option<f64>,
    current_total_override: Option<f64>,
    stats: AggregateStats,
    billing: BillingSummary,
}

fn merge(clear: bool, current: Option<f64>, new: Option<f64>) -> Option<f64> {
    new.or(if clear { None } else { current })
}

pub fn run_billing(
    args: &BillingArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let summarize = |project: &obra_core::Project| {
        let stats = project.stats();
        BillingOutput {
            measurement_number: project.measurement_number,
            discount_percent: project.discount_percent,
            iss_percent: project.iss_percent,
            contract_total_override: project.contract_total_override,
            current_total_override: project.current_total_override,
            billing: project.billing_for(&stats),
            stats,
        }
    };

    let result = if args.changes_anything() {
        let result = apply(project_root, output, |project| {
            let next = set_deductions(
                project,
                merge(args.clear_deductions, project.discount_percent, args.discount),
                merge(args.clear_deductions, project.iss_percent, args.iss),
            )?;
            let next = set_overrides(
                &next,
                merge(
                    args.clear_overrides,
                    project.contract_total_override,
                    args.contract_override,
                ),
                merge(
                    args.clear_overrides,
                    project.current_total_override,
                    args.current_override,
                ),
            )?;
            let result = summarize(&next);
            Ok((next, result))
        })?;
        tracing::info!(
            discount = ?result.discount_percent,
            iss = ?result.iss_percent,
            contract_override = ?result.contract_total_override,
            current_override = ?result.current_total_override,
            "updated billing settings"
        );
        result
    } else {
        summarize(&crate::cmd::load_project(project_root, output)?)
    };

    render(output, &result, |r, w| {
        let optional = |v: Option<f64>, f: fn(f64) -> String| v.map_or_else(|| "-".to_string(), f);
        pretty_section(w, &format!("Billing, measurement {}", r.measurement_number))?;
        pretty_kv(w, "Discount rate", optional(r.discount_percent, pct))?;
        pretty_kv(w, "ISS rate", optional(r.iss_percent, pct))?;
        pretty_kv(w, "Contract fixed", optional(r.contract_total_override, amount))?;
        pretty_kv(w, "Current fixed", optional(r.current_total_override, amount))?;
        writeln!(w)?;
        write_stats(w, &r.stats)?;
        writeln!(w)?;
        write_billing(w, &r.billing)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_unspecified_settings() {
        assert_eq!(merge(false, Some(5.0), None), Some(5.0));
        assert_eq!(merge(false, Some(5.0), Some(2.0)), Some(2.0));
        assert_eq!(merge(true, Some(5.0), None), None);
        assert_eq!(merge(true, Some(5.0), Some(3.0)), Some(3.0));
    }

    #[test]
    fn no_flags_is_read_only() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: BillingArgs,
        }
        let w = Wrapper::parse_from(["test"]);
        assert!(!w.args.changes_anything());
        let w = Wrapper::parse_from(["test", "--iss", "5"]);
        assert!(w.args.changes_anything());
    }
}
