//! `obra add` — add a category or a priced item to the WBS.

use crate::cmd::show::render_row;
use crate::cmd::{apply, row_of};
use crate::ids;
use crate::output::{CliError, OutputMode, fail};
use clap::{ArgGroup, Args, Subcommand};
use obra_core::WorkItemRecord;
use obra_core::config::ProjectConfig;
use obra_core::edit::{add_item, apply_price_edit, next_order};
use obra_core::error::ErrorCode;
use obra_core::model::ItemType;
use obra_core::pricing::PriceEdit;
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum AddCommand {
    /// Add a grouping category. Its totals roll up from the items below it.
    Category(CategoryArgs),
    /// Add a priced budget item.
    Item(ItemArgs),
}

/// Where the new node goes and how it is labelled.
#[derive(Args, Debug)]
pub struct PlacementArgs {
    /// Description shown in the WBS.
    pub description: String,

    /// Parent category ID. Omit for a top-level node.
    #[arg(long, short)]
    pub parent: Option<String>,

    /// Sibling sort key. Defaults to after the last sibling.
    #[arg(long)]
    pub order: Option<i64>,

    /// Explicit ID. Generated from the description when omitted.
    #[arg(long)]
    pub id: Option<String>,

    /// Reference code from a price catalogue.
    #[arg(long, default_value = "")]
    pub code: String,
}

#[derive(Args, Debug)]
pub struct CategoryArgs {
    #[command(flatten)]
    pub placement: PlacementArgs,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("pricing")
        .required(true)
        .args(["price", "price_with_overhead", "total"])
))]
pub struct ItemArgs {
    #[command(flatten)]
    pub placement: PlacementArgs,

    /// Contract quantity.
    #[arg(long)]
    pub qty: f64,

    /// Unit of measure. Defaults to `items.default_unit`.
    #[arg(long, short)]
    pub unit: Option<String>,

    /// Unit price before overhead.
    #[arg(long)]
    pub price: Option<f64>,

    /// Unit price with overhead included.
    #[arg(long)]
    pub price_with_overhead: Option<f64>,

    /// Contract total with overhead included. Needs a positive quantity.
    #[arg(long)]
    pub total: Option<f64>,
}

impl ItemArgs {
    /// Pricing edit to reconcile after the item exists, for inputs other
    /// than the base price.
    fn price_follow_up(&self) -> Option<PriceEdit> {
        self.price_with_overhead
            .map(PriceEdit::WithOverhead)
            .or(self.total.map(PriceEdit::Total))
    }

    /// A total cannot be spread over a zero quantity.
    fn check(&self) -> Result<(), CliError> {
        if self.total.is_some() && self.qty <= 0.0 {
            return Err(CliError::with_details(
                "--total needs a positive --qty",
                "set --qty, or price the item with --price or --price-with-overhead",
                ErrorCode::InvalidRecord.code(),
            ));
        }
        Ok(())
    }
}

pub fn run_add(
    cmd: &AddCommand,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let placement = match cmd {
        AddCommand::Category(args) => &args.placement,
        AddCommand::Item(args) => {
            args.check().map_err(|e| fail(output, e))?;
            &args.placement
        }
    };

    let row = apply(project_root, output, |project| {
        let id = placement.id.clone().unwrap_or_else(|| {
            ids::generate(
                "wi",
                &placement.description,
                project.items.iter().map(|i| i.id.as_str()),
            )
        });
        let parent = placement.parent.as_deref();
        let mut record = WorkItemRecord {
            id: id.clone(),
            parent_id: placement.parent.clone(),
            item_type: Some(ItemType::Category),
            order: placement
                .order
                .unwrap_or_else(|| next_order(project, parent)),
            description: placement.description.clone(),
            source_code: placement.code.clone(),
            ..WorkItemRecord::default()
        };

        let mut follow_up = None;
        if let AddCommand::Item(args) = cmd {
            record.item_type = Some(ItemType::Item);
            record.unit = args
                .unit
                .clone()
                .unwrap_or_else(|| config.items.default_unit.clone());
            record.contract_quantity = Some(args.qty);
            record.unit_price_no_overhead = Some(args.price.unwrap_or(0.0));
            record.previous_quantity = Some(0.0);
            record.previous_total = Some(0.0);
            record.current_quantity = Some(0.0);
            record.current_total = Some(0.0);
            follow_up = args.price_follow_up();
        }

        let mut next = add_item(project, record)?;
        if let Some(edit) = follow_up {
            next = apply_price_edit(&next, &id, edit)?;
        }
        let row = row_of(&next, &id)?;
        Ok((next, row))
    })?;

    tracing::info!(id = %row.id, kind = %row.item_type, wbs = %row.wbs, "added work item");
    render_row(output, &row, "Added")
}
