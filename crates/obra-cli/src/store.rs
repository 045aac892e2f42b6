//! On-disk project storage under `.obra/`.
//!
//! ```text
//! .obra/
//!   project.json   (items, open period, history, ledger)
//!   config.toml    (project config, see obra_core::config)
//!   project.lock   (advisory lock held by mutating commands)
//! ```
//!
//! Items are written in their storage record form and pass through record
//! validation on every load, so a hand-edited file with a priced category or
//! a missing base price is rejected instead of silently defaulted.

use crate::lock::{LockError, ProjectLock};
use obra_core::model::{Project, WorkItemRecord, validate_records};
use obra_core::{ErrorCode, ValidationError};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const OBRA_DIR: &str = ".obra";
const PROJECT_FILE: &str = "project.json";
const LOCK_FILE: &str = "project.lock";
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no obra project found at or above {}", .0.display())]
    NotInitialized(PathBuf),

    #[error("failed to parse {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{} contains an invalid work item: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized(_) => ErrorCode::NotInitialized,
            Self::Corrupt { .. } => ErrorCode::ProjectFileCorrupt,
            Self::Invalid { source, .. } => source.code(),
            Self::Io { .. } => ErrorCode::ProjectWriteFailed,
            Self::Lock(e) => e.code(),
        }
    }
}

/// Handle to a project directory that contains `.obra/project.json`.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Find the nearest project at or above `start`.
    pub fn discover(start: &Path) -> Result<Self, StoreError> {
        start
            .ancestors()
            .find(|dir| dir.join(OBRA_DIR).join(PROJECT_FILE).is_file())
            .map(|root| Self {
                root: root.to_path_buf(),
            })
            .ok_or_else(|| StoreError::NotInitialized(start.to_path_buf()))
    }

    /// A store rooted at `root`, whether or not a project exists there yet.
    pub fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Directory containing `.obra/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn obra_dir(&self) -> PathBuf {
        self.root.join(OBRA_DIR)
    }

    fn project_path(&self) -> PathBuf {
        self.obra_dir().join(PROJECT_FILE)
    }

    pub fn exists(&self) -> bool {
        self.project_path().is_file()
    }

    /// Take the exclusive project lock.
    pub fn lock(&self) -> Result<ProjectLock, StoreError> {
        Ok(ProjectLock::acquire(
            &self.obra_dir().join(LOCK_FILE),
            LOCK_TIMEOUT,
        )?)
    }

    pub fn load(&self) -> Result<Project, StoreError> {
        let path = self.project_path();
        let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        decode(&content).map_err(|err| err.at(path))
    }

    /// Write the project atomically (temp file, then rename).
    pub fn save(&self, project: &Project) -> Result<(), StoreError> {
        let path = self.project_path();
        let json = encode(project).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(self.obra_dir()).map_err(io_err)?;
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;

        tracing::debug!(path = %path.display(), items = project.items.len(), "saved project");
        Ok(())
    }

    /// Load, transform, and save under the project lock.
    ///
    /// The closure's error type is returned unchanged; store failures are
    /// converted into it with `From`.
    pub fn update<T, E>(&self, f: impl FnOnce(&Project) -> Result<(Project, T), E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let _lock = self.lock()?;
        let project = self.load()?;
        let (next, out) = f(&project)?;
        self.save(&next)?;
        Ok(out)
    }
}

enum DecodeError {
    Json(serde_json::Error),
    Invalid(ValidationError),
}

impl DecodeError {
    fn at(self, path: PathBuf) -> StoreError {
        match self {
            Self::Json(source) => StoreError::Corrupt { path, source },
            Self::Invalid(source) => StoreError::Invalid { path, source },
        }
    }
}

fn decode(content: &str) -> Result<Project, DecodeError> {
    let mut value: serde_json::Value = serde_json::from_str(content).map_err(DecodeError::Json)?;
    let records: Vec<WorkItemRecord> = match value.as_object_mut().and_then(|o| o.remove("items")) {
        Some(items) => serde_json::from_value(items).map_err(DecodeError::Json)?,
        None => Vec::new(),
    };
    let mut project: Project = serde_json::from_value(value).map_err(DecodeError::Json)?;
    project.items = validate_records(records).map_err(DecodeError::Invalid)?;
    Ok(project)
}

fn encode(project: &Project) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(project)?;
    let records: Vec<WorkItemRecord> = project.items.iter().map(WorkItemRecord::from).collect();
    if let Some(object) = value.as_object_mut() {
        object.insert("items".to_string(), serde_json::to_value(records)?);
    }
    serde_json::to_string_pretty(&value)
}
