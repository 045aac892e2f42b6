pub mod add;
pub mod assign;
pub mod billing;
pub mod close;
pub mod delete;
pub mod forecast;
pub mod history;
pub mod init;
pub mod ledger;
pub mod measure;
pub mod move_cmd;
pub mod overhead;
pub mod price;
pub mod reopen;
pub mod show;

use crate::output::{CliError, OutputMode, fail};
use crate::store::{Store, StoreError};
use obra_core::tree::WbsRow;
use obra_core::{EngineError, Project};
use std::path::Path;

/// Failure of a locked load-edit-save cycle.
#[derive(Debug)]
pub enum EditError {
    Engine(EngineError),
    Store(StoreError),
}

impl From<EngineError> for EditError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<StoreError> for EditError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<&EditError> for CliError {
    fn from(err: &EditError) -> Self {
        match err {
            EditError::Engine(e) => Self::from(e),
            EditError::Store(e) => Self::from(e),
        }
    }
}

/// Locate the project above `project_root`, rendering a failure.
pub fn open_store(project_root: &Path, output: OutputMode) -> anyhow::Result<Store> {
    Store::discover(project_root).map_err(|e| fail(output, CliError::from(&e)))
}

/// Load the project for a read-only command.
pub fn load_project(project_root: &Path, output: OutputMode) -> anyhow::Result<Project> {
    let store = open_store(project_root, output)?;
    store.load().map_err(|e| fail(output, CliError::from(&e)))
}

/// Apply an engine edit under the project lock and persist the result.
pub fn apply<T>(
    project_root: &Path,
    output: OutputMode,
    edit: impl FnOnce(&Project) -> Result<(Project, T), EngineError>,
) -> anyhow::Result<T> {
    let store = open_store(project_root, output)?;
    store
        .update(|project| edit(project).map_err(EditError::from))
        .map_err(|e: EditError| fail(output, CliError::from(&e)))
}

/// The display row of `id` in the open period.
pub fn row_of(project: &Project, id: &str) -> Result<WbsRow, EngineError> {
    project
        .report()
        .rows
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| EngineError::ItemNotFound(id.to_string()))
}
