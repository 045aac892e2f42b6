//! `obra measure` — record progress on an item for the open period.
//!
//! Progress can be entered as a quantity, as a percentage of the contract
//! quantity, or as an amount. Each call replaces the item's current-period
//! figures; it does not add to them. Negative values correct earlier
//! over-measurement.

use crate::cmd::show::render_row;
use crate::cmd::{apply, row_of};
use crate::output::OutputMode;
use clap::{ArgGroup, Args};
use obra_core::edit::{MeasureEdit, apply_measurement};
use std::path::Path;

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("progress")
        .required(true)
        .args(["qty", "percent", "total"])
))]
pub struct MeasureArgs {
    /// Work item ID.
    pub id: String,

    /// Quantity executed this period.
    #[arg(long, allow_negative_numbers = true)]
    pub qty: Option<f64>,

    /// Share of the contract quantity executed this period, in percent.
    #[arg(long, allow_negative_numbers = true)]
    pub percent: Option<f64>,

    /// Amount executed this period, overhead included.
    #[arg(long, allow_negative_numbers = true)]
    pub total: Option<f64>,
}

impl MeasureArgs {
    fn edit(&self) -> Option<MeasureEdit> {
        self.qty
            .map(MeasureEdit::Quantity)
            .or(self.percent.map(MeasureEdit::Percentage))
            .or(self.total.map(MeasureEdit::Total))
    }
}

pub fn run_measure(
    args: &MeasureArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let Some(edit) = args.edit() else {
        anyhow::bail!("one of --qty, --percent, or --total is required");
    };

    let row = apply(project_root, output, |project| {
        let next = apply_measurement(project, &args.id, edit)?;
        let row = row_of(&next, &args.id)?;
        Ok((next, row))
    })?;

    tracing::info!(
        id = %args.id,
        current_total = row.current_total,
        measurement = ?edit,
        "recorded measurement"
    );
    render_row(output, &row, "Measured")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: MeasureArgs,
    }

    #[test]
    fn percent_maps_to_percentage_edit() {
        let w = Wrapper::parse_from(["test", "wi-1", "--percent", "50"]);
        assert_eq!(w.args.edit(), Some(MeasureEdit::Percentage(50.0)));
    }

    #[test]
    fn negative_quantity_is_accepted() {
        let w = Wrapper::parse_from(["test", "wi-1", "--qty", "-2"]);
        assert_eq!(w.args.edit(), Some(MeasureEdit::Quantity(-2.0)));
    }

    #[test]
    fn progress_inputs_are_exclusive() {
        assert!(Wrapper::try_parse_from(["test", "wi-1", "--qty", "1", "--percent", "2"]).is_err());
        assert!(Wrapper::try_parse_from(["test", "wi-1"]).is_err());
    }
}
