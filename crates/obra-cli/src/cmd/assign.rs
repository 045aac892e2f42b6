//! `obra assign` — name a person or team responsible for a work item.
//!
//! Assignments are removed together with their item by `obra delete`.

use crate::cmd::apply;
use crate::ids;
use crate::output::{OutputMode, render};
use clap::Args;
use obra_core::edit::assign;
use obra_core::model::Responsibility;
use std::path::Path;

#[derive(Args, Debug)]
pub struct AssignArgs {
    /// Work item ID.
    pub item: String,

    /// Person or team name.
    pub name: String,

    /// Role on the item (e.g. foreman, supplier).
    #[arg(long, short, default_value = "")]
    pub role: String,
}

pub fn run_assign(
    args: &AssignArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let responsibility = apply(project_root, output, |project| {
        let responsibility = Responsibility {
            id: ids::generate(
                "rs",
                &format!("{}:{}", args.item, args.name),
                project.responsibilities.iter().map(|r| r.id.as_str()),
            ),
            work_item_id: args.item.clone(),
            name: args.name.clone(),
            role: args.role.clone(),
        };
        let next = assign(project, responsibility.clone())?;
        Ok((next, responsibility))
    })?;

    tracing::info!(
        id = %responsibility.id,
        item = %responsibility.work_item_id,
        "assigned responsibility"
    );

    render(output, &responsibility, |r, w| {
        if r.role.is_empty() {
            writeln!(w, "✓ {} assigned to {} ({})", r.name, r.work_item_id, r.id)
        } else {
            writeln!(w, "✓ {} assigned to {} as {} ({})", r.name, r.work_item_id, r.role, r.id)
        }
    })
}
