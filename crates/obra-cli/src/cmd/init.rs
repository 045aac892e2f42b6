//! `obra init` — create a project in the current directory.

use crate::output::{OutputMode, pretty_kv, render};
use crate::store::{OBRA_DIR, Store};
use anyhow::{Context as _, Result};
use clap::Args;
use obra_core::Project;
use obra_core::config::ProjectConfig;
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project (contract) name.
    pub name: String,

    /// Overhead index in percent. Defaults to `engine.default_overhead_index`.
    #[arg(long)]
    pub overhead: Option<f64>,

    /// Replace an existing project file. History is lost.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[engine]\n\
    default_overhead_index = 0.0\n\
    \n\
    [items]\n\
    default_unit = \"un\"\n\
    \n\
    [ledger]\n\
    default_category = \"Materials\"\n\
    \n\
    [reopen]\n\
    require_confirmation = true\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    name: String,
    overhead_index: f64,
    measurement_number: u32,
    path: String,
}

/// Execute `obra init`. Creates the project skeleton:
///
/// ```text
/// .obra/
///   project.json   (empty project in measurement 1)
///   config.toml    (default project config, kept if present)
/// ```
///
/// # Errors
///
/// Returns an error if a project already exists and `--force` is not set,
/// or if any filesystem operation fails.
pub fn run_init(
    args: &InitArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> Result<()> {
    let store = Store::at(project_root);
    if store.exists() && !args.force {
        anyhow::bail!(
            "{OBRA_DIR}/ already holds a project. Use `obra init --force` to replace it."
        );
    }

    let overhead_index = args
        .overhead
        .unwrap_or(config.engine.default_overhead_index);
    let project =
        obra_core::edit::set_overhead_index(&Project::new(&args.name, 0.0), overhead_index)
            .map_err(|e| crate::output::fail(output, (&e).into()))?;

    let config_path = store.obra_dir().join("config.toml");
    {
        let _lock = store.lock().context("Failed to lock project")?;
        store.save(&project).context("Failed to write project file")?;
        if !config_path.exists() {
            std::fs::write(&config_path, CONFIG_TOML)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }
    }

    tracing::info!(name = %args.name, overhead_index, "initialized project");

    let result = InitOutput {
        name: project.name.clone(),
        overhead_index,
        measurement_number: project.measurement_number,
        path: store.obra_dir().display().to_string(),
    };
    render(output, &result, |r, w| {
        writeln!(w, "✓ Initialized project '{}'", r.name)?;
        pretty_kv(w, "Overhead", format!("{}%", r.overhead_index))?;
        pretty_kv(w, "Measurement", r.measurement_number.to_string())?;
        pretty_kv(w, "Directory", &r.path)?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  obra add category \"Structure\"")?;
        writeln!(w, "  obra add item \"Slab\" --parent <id> --qty 10 --price 50")
    })
}
