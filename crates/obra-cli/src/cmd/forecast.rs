//! `obra forecast` — record an expected purchase and post it to the ledger.

use crate::cmd::apply;
use crate::ids;
use crate::output::{OutputMode, amount, pretty_kv, render};
use clap::Args;
use obra_core::config::LedgerConfig;
use obra_core::edit::record_forecast;
use obra_core::ledger::{LedgerEntry, PaymentState, SupplyForecast, forecast_to_ledger};
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ForecastArgs {
    /// What is being bought.
    pub description: String,

    /// Quantity to buy.
    #[arg(long)]
    pub qty: f64,

    /// Unit price.
    #[arg(long)]
    pub price: f64,

    /// Payment state: pending, paid, or overdue.
    #[arg(long, default_value = "pending")]
    pub state: PaymentState,

    /// Ledger category. Defaults to `ledger.default_category`.
    #[arg(long)]
    pub category: Option<String>,

    /// Explicit forecast ID. Generated when omitted.
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ForecastOutput {
    forecast: SupplyForecast,
    entry: LedgerEntry,
}

pub fn run_forecast(
    args: &ForecastArgs,
    output: OutputMode,
    project_root: &Path,
    config: &LedgerConfig,
) -> anyhow::Result<()> {
    let result = apply(project_root, output, |project| {
        let forecast = SupplyForecast {
            id: args.id.clone().unwrap_or_else(|| {
                ids::generate(
                    "sf",
                    &args.description,
                    project.forecasts.iter().map(|f| f.id.as_str()),
                )
            }),
            description: args.description.clone(),
            quantity: args.qty,
            unit_price: args.price,
            payment_state: args.state,
        };
        let entry = forecast_to_ledger(&forecast, args.category.as_deref(), config);
        let next = record_forecast(project, forecast.clone(), args.category.as_deref(), config)?;
        Ok((next, ForecastOutput { forecast, entry }))
    })?;

    tracing::info!(
        id = %result.forecast.id,
        amount = result.entry.amount,
        category = %result.entry.category,
        "recorded forecast"
    );

    render(output, &result, |r, w| {
        writeln!(w, "✓ Forecast {} posted to the ledger", r.forecast.id)?;
        pretty_kv(w, "Description", &r.entry.description)?;
        pretty_kv(w, "Category", &r.entry.category)?;
        pretty_kv(w, "Amount", amount(r.entry.amount))?;
        pretty_kv(w, "State", r.entry.payment_state.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ForecastArgs,
    }

    #[test]
    fn state_defaults_to_pending() {
        let w = Wrapper::parse_from(["test", "Cement", "--qty", "10", "--price", "32.5"]);
        assert_eq!(w.args.state, PaymentState::Pending);
        assert!(w.args.category.is_none());
    }

    #[test]
    fn state_parses_case_insensitively() {
        let w = Wrapper::parse_from([
            "test", "Cement", "--qty", "1", "--price", "1", "--state", "Paid",
        ]);
        assert_eq!(w.args.state, PaymentState::Paid);
        assert!(
            Wrapper::try_parse_from(["test", "x", "--qty", "1", "--price", "1", "--state", "late"])
                .is_err()
        );
    }
}
