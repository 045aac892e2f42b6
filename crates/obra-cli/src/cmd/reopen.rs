//! `obra reopen` — discard the open period and restore the latest closed one.
//!
//! Reopening throws away every edit made since the close. Unless
//! `reopen.require_confirmation` is turned off, the command only prints what
//! would be lost and exits with `E3004` until `--yes` is given.

use crate::cmd::{apply, load_project};
use crate::output::{CliError, OutputMode, fail, pretty_kv, render};
use clap::Args;
use obra_core::ErrorCode;
use obra_core::config::ReopenConfig;
use obra_core::period::{ReopenPreview, reopen_period, reopen_preview};
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ReopenArgs {
    /// Measurement number to reopen. Must be the latest closed one.
    pub measurement: u32,

    /// Confirm that edits made since the close will be discarded.
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct ReopenOutput {
    reopened_measurement: u32,
    #[serde(flatten)]
    preview: ReopenPreview,
}

fn write_preview(w: &mut dyn std::io::Write, p: &ReopenPreview) -> std::io::Result<()> {
    pretty_kv(w, "Discarded", format!("measurement {}", p.discarded_period))?;
    let lists = [
        ("Edited", &p.changed_items),
        ("Added", &p.removed_items),
        ("Deleted", &p.restored_items),
    ];
    for (label, ids) in lists {
        if !ids.is_empty() {
            pretty_kv(w, label, ids.join(", "))?;
        }
    }
    Ok(())
}

pub fn run_reopen(
    args: &ReopenArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ReopenConfig,
) -> anyhow::Result<()> {
    if config.require_confirmation && !args.yes {
        let project = load_project(project_root, output)?;
        let preview =
            reopen_preview(&project, args.measurement).map_err(|e| fail(output, (&e).into()))?;
        if !output.is_json() {
            let stderr = std::io::stderr();
            let mut err = stderr.lock();
            write_preview(&mut err, &preview)?;
        }
        let message = if preview.discards_edits() {
            format!(
                "reopening measurement {} discards edits made since it was closed",
                args.measurement
            )
        } else {
            format!("reopening measurement {} needs confirmation", args.measurement)
        };
        return Err(fail(
            output,
            CliError::with_details(
                message,
                format!("Re-run `obra reopen {} --yes` to confirm.", args.measurement),
                ErrorCode::ConfirmationRequired.code(),
            ),
        ));
    }

    let result = apply(project_root, output, |project| {
        let preview = reopen_preview(project, args.measurement)?;
        let next = reopen_period(project, args.measurement)?;
        Ok((
            next,
            ReopenOutput {
                reopened_measurement: args.measurement,
                preview,
            },
        ))
    })?;

    tracing::warn!(
        measurement = result.reopened_measurement,
        discarded = result.preview.discarded_period,
        "reopened measurement"
    );

    render(output, &result, |r, w| {
        writeln!(w, "✓ Reopened measurement {}", r.reopened_measurement)?;
        write_preview(w, &r.preview)
    })
}
