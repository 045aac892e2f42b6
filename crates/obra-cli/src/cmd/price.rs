//! `obra price` — edit one pricing field of an item and reconcile the others.
//!
//! Exactly one of `--base`, `--with-overhead`, `--total`, or `--qty` is
//! applied per call. The remaining fields are derived from it at the current
//! overhead index.

use crate::cmd::show::render_row;
use crate::cmd::{apply, row_of};
use crate::output::OutputMode;
use clap::{ArgGroup, Args};
use obra_core::edit::apply_price_edit;
use obra_core::pricing::PriceEdit;
use std::path::Path;

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("field")
        .required(true)
        .args(["base", "with_overhead", "total", "qty"])
))]
pub struct PriceArgs {
    /// Work item ID.
    pub id: String,

    /// Unit price before overhead.
    #[arg(long)]
    pub base: Option<f64>,

    /// Unit price with overhead included.
    #[arg(long)]
    pub with_overhead: Option<f64>,

    /// Contract total. Ignored for an item with zero quantity.
    #[arg(long)]
    pub total: Option<f64>,

    /// Contract quantity. The unit price is kept.
    #[arg(long)]
    pub qty: Option<f64>,
}

impl PriceArgs {
    fn edit(&self) -> Option<PriceEdit> {
        self.base
            .map(PriceEdit::NoOverhead)
            .or(self.with_overhead.map(PriceEdit::WithOverhead))
            .or(self.total.map(PriceEdit::Total))
            .or(self.qty.map(PriceEdit::Quantity))
    }
}

pub fn run_price(args: &PriceArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let Some(edit) = args.edit() else {
        anyhow::bail!("one of --base, --with-overhead, --total, or --qty is required");
    };

    let row = apply(project_root, output, |project| {
        let next = apply_price_edit(project, &args.id, edit)?;
        let row = row_of(&next, &args.id)?;
        Ok((next, row))
    })?;

    tracing::info!(id = %args.id, field = ?edit.field(), "repriced work item");
    render_row(output, &row, "Repriced")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: PriceArgs,
    }

    #[test]
    fn single_field_maps_to_edit() {
        let w = Wrapper::parse_from(["test", "wi-1", "--with-overhead", "72"]);
        assert_eq!(w.args.id, "wi-1");
        assert_eq!(w.args.edit(), Some(PriceEdit::WithOverhead(72.0)));

        let w = Wrapper::parse_from(["test", "wi-1", "--qty", "3"]);
        assert_eq!(w.args.edit(), Some(PriceEdit::Quantity(3.0)));
    }

    #[test]
    fn fields_are_mutually_exclusive() {
        assert!(Wrapper::try_parse_from(["test", "wi-1", "--base", "1", "--total", "2"]).is_err());
        assert!(Wrapper::try_parse_from(["test", "wi-1"]).is_err());
    }
}
