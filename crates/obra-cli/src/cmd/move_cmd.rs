//! `obra move` — reparent an item together with its subtree.

use crate::cmd::show::render_row;
use crate::cmd::{apply, row_of};
use crate::output::OutputMode;
use clap::{ArgGroup, Args};
use obra_core::edit::move_item;
use std::path::Path;

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("destination")
        .required(true)
        .args(["parent", "root"])
))]
pub struct MoveArgs {
    /// Work item ID to move.
    pub id: String,

    /// New parent category ID.
    #[arg(long, short)]
    pub parent: Option<String>,

    /// Move to the top level.
    #[arg(long)]
    pub root: bool,

    /// Sibling sort key at the destination. Defaults to after the last sibling.
    #[arg(long)]
    pub order: Option<i64>,
}

pub fn run_move(args: &MoveArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let parent = if args.root { None } else { args.parent.as_deref() };

    let row = apply(project_root, output, |project| {
        let next = move_item(project, &args.id, parent, args.order)?;
        let row = row_of(&next, &args.id)?;
        Ok((next, row))
    })?;

    tracing::info!(id = %args.id, parent = ?parent, wbs = %row.wbs, "moved work item");
    render_row(output, &row, "Moved")
}
