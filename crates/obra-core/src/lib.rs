//! obra-core library.
//!
//! Work breakdown structure aggregation, overhead pricing, and measurement
//! period rollover for construction contracts. Everything here is a pure
//! transformation over borrowed values; persistence and locking belong to the
//! caller.
//!
//! # Conventions
//!
//! - **Money**: `f64` rounded to cents with [`money::round2`] after every
//!   arithmetic step. Division by zero yields 0.
//! - **Errors**: engine operations return [`error::EngineError`]; config
//!   loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod edit;
pub mod error;
pub mod ledger;
pub mod model;
pub mod money;
pub mod period;
pub mod pricing;
pub mod tree;

pub use error::{EngineError, ErrorCode, PreconditionError, ValidationError};
pub use model::{MeasurementSnapshot, Project, WorkItem, WorkItemRecord};
