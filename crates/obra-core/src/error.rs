use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    ProjectFileCorrupt,
    ItemNotFound,
    InvalidRecord,
    ParentNotCategory,
    CycleDetected,
    DuplicateId,
    NothingMeasured,
    NoClosedPeriod,
    NotLatestSnapshot,
    ConfirmationRequired,
    LockContention,
    ProjectWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ProjectFileCorrupt => "E1003",
            Self::ItemNotFound => "E2001",
            Self::InvalidRecord => "E2002",
            Self::ParentNotCategory => "E2003",
            Self::CycleDetected => "E2004",
            Self::DuplicateId => "E2005",
            Self::NothingMeasured => "E3001",
            Self::NoClosedPeriod => "E3002",
            Self::NotLatestSnapshot => "E3003",
            Self::ConfirmationRequired => "E3004",
            Self::LockContention => "E5001",
            Self::ProjectWriteFailed => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::ProjectFileCorrupt => "Project file could not be read",
            Self::ItemNotFound => "Work item not found",
            Self::InvalidRecord => "Invalid work item record",
            Self::ParentNotCategory => "Parent is not a category",
            Self::CycleDetected => "Cycle would be created",
            Self::DuplicateId => "Duplicate work item ID",
            Self::NothingMeasured => "Nothing measured in the open period",
            Self::NoClosedPeriod => "No closed measurement to reopen",
            Self::NotLatestSnapshot => "Only the latest measurement can be reopened",
            Self::ConfirmationRequired => "Destructive action needs confirmation",
            Self::LockContention => "Lock contention",
            Self::ProjectWriteFailed => "Project file write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `obra init` to create a project here."),
            Self::ConfigParseError => Some("Fix syntax in .obra/config.toml and retry."),
            Self::ProjectFileCorrupt => Some("Restore .obra/project.json from a backup."),
            Self::ItemNotFound => None,
            Self::InvalidRecord => {
                Some("Items need a quantity and a base price; categories carry neither.")
            }
            Self::ParentNotCategory => Some("Only categories may contain other work items."),
            Self::CycleDetected => Some("Pick a parent outside the subtree being moved."),
            Self::DuplicateId => Some("Use a fresh ID for the new work item."),
            Self::NothingMeasured => {
                Some("Record a current quantity or value on at least one item first.")
            }
            Self::NoClosedPeriod => None,
            Self::NotLatestSnapshot => Some("Reopen measurements one at a time, newest first."),
            Self::ConfirmationRequired => Some("Re-run with --yes to confirm."),
            Self::LockContention => Some("Retry after the other `obra` process releases its lock."),
            Self::ProjectWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A work item record was rejected before entering the tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("item '{item_id}' is missing required field '{field}'")]
    MissingField { item_id: String, field: &'static str },

    #[error("category '{item_id}' must not carry '{field}'")]
    CategoryHasPricing { item_id: String, field: &'static str },

    #[error("item '{item_id}' has a non-finite value for '{field}'")]
    NonFinite { item_id: String, field: &'static str },

    #[error("item '{item_id}' has a negative value for '{field}': {value}")]
    Negative {
        item_id: String,
        field: &'static str,
        value: f64,
    },

    #[error("a work item with id '{0}' already exists")]
    DuplicateId(String),

    #[error("item '{item_id}' references missing parent '{parent_id}'")]
    ParentNotFound { item_id: String, parent_id: String },

    #[error("item '{item_id}' cannot be placed under '{parent_id}': only categories may be parents")]
    ParentNotCategory { item_id: String, parent_id: String },

    #[error("moving '{item_id}' under '{proposed_parent}' would create a cycle")]
    CycleDetected {
        item_id: String,
        proposed_parent: String,
    },
}

impl ValidationError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingField { .. }
            | Self::CategoryHasPricing { .. }
            | Self::NonFinite { .. }
            | Self::Negative { .. } => ErrorCode::InvalidRecord,
            Self::DuplicateId(_) => ErrorCode::DuplicateId,
            Self::ParentNotFound { .. } => ErrorCode::ItemNotFound,
            Self::ParentNotCategory { .. } => ErrorCode::ParentNotCategory,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
        }
    }
}

/// A period transition was attempted from a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("measurement {measurement_number} has no recorded progress; nothing to close")]
    NothingMeasured { measurement_number: u32 },

    #[error("no closed measurement to reopen")]
    NoClosedPeriod,

    #[error("measurement {requested} cannot be reopened; only the latest ({latest}) can")]
    NotLatestSnapshot { requested: u32, latest: u32 },
}

impl PreconditionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NothingMeasured { .. } => ErrorCode::NothingMeasured,
            Self::NoClosedPeriod => ErrorCode::NoClosedPeriod,
            Self::NotLatestSnapshot { .. } => ErrorCode::NotLatestSnapshot,
        }
    }
}

/// Any rejection raised by an engine operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("work item not found: '{0}'")]
    ItemNotFound(String),
}

impl EngineError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(e) => e.code(),
            Self::Precondition(e) => e.code(),
            Self::ItemNotFound(_) => ErrorCode::ItemNotFound,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
