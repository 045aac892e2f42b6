//! Records exchanged with the persistence and presentation collaborators.

pub mod item;
pub mod project;

pub use item::{ItemFigures, ItemType, WorkItem, WorkItemRecord, validate_records};
pub use project::{BillingSummary, MeasurementSnapshot, Project, Responsibility};
