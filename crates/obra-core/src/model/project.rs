use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::item::WorkItem;
use crate::ledger::{LedgerEntry, SupplyForecast};
use crate::money::round2;
use crate::tree::aggregate::{AggregateStats, WbsReport, aggregate};
use crate::tree::descendants::Reference;

/// A person or team answerable for a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Responsibility {
    pub id: String,
    pub work_item_id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
}

impl Reference for Responsibility {
    fn id(&self) -> &str {
        &self.id
    }

    fn referenced_id(&self) -> &str {
        &self.work_item_id
    }
}

/// Amounts billed for one measurement period after optional deductions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub gross: f64,
    pub discount: f64,
    pub iss: f64,
    pub net: f64,
}

impl BillingSummary {
    /// Discount applies to the gross amount; ISS applies to what remains.
    #[must_use]
    pub fn compute(gross: f64, discount_percent: Option<f64>, iss_percent: Option<f64>) -> Self {
        let discount = round2(gross * discount_percent.unwrap_or(0.0) / 100.0);
        let iss = round2((gross - discount) * iss_percent.unwrap_or(0.0) / 100.0);
        Self {
            gross,
            discount,
            iss,
            net: round2(gross - discount - iss),
        }
    }
}

/// Frozen record of a closed measurement period.
///
/// Created only by [`crate::period::close_period`] and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSnapshot {
    pub measurement_number: u32,
    pub date: NaiveDate,
    /// The item list exactly as it stood when the period was closed.
    pub items: Vec<WorkItem>,
    pub stats: AggregateStats,
    pub billing: BillingSummary,
    /// Overhead index in force at close, for re-deriving row prices.
    #[serde(default)]
    pub overhead_index: f64,
    /// The period override in force at close, restored on reopen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_total_override: Option<f64>,
}

/// A construction contract: its budget tree, open period, and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub items: Vec<WorkItem>,
    #[serde(default = "first_measurement")]
    pub measurement_number: u32,
    /// Closed periods, most recent first.
    #[serde(default)]
    pub history: Vec<MeasurementSnapshot>,
    #[serde(default)]
    pub overhead_index: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_total_override: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_total_override: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss_percent: Option<f64>,
    #[serde(default)]
    pub responsibilities: Vec<Responsibility>,
    #[serde(default)]
    pub forecasts: Vec<SupplyForecast>,
    #[serde(default)]
    pub ledger: Vec<LedgerEntry>,
}

const fn first_measurement() -> u32 {
    1
}

impl Project {
    /// An empty project in its first open measurement period.
    #[must_use]
    pub fn new(name: impl Into<String>, overhead_index: f64) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
            measurement_number: first_measurement(),
            history: Vec::new(),
            overhead_index,
            contract_total_override: None,
            current_total_override: None,
            discount_percent: None,
            iss_percent: None,
            responsibilities: Vec::new(),
            forecasts: Vec::new(),
            ledger: Vec::new(),
        }
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&WorkItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Rows and stats for the open period, with project overrides applied.
    #[must_use]
    pub fn report(&self) -> WbsReport {
        let mut report = aggregate(&self.items, self.overhead_index);
        report.stats = report
            .stats
            .with_overrides(self.contract_total_override, self.current_total_override);
        report
    }

    #[must_use]
    pub fn stats(&self) -> AggregateStats {
        self.report().stats
    }

    /// Billing for the open period, from the effective current total.
    #[must_use]
    pub fn billing(&self) -> BillingSummary {
        self.billing_for(&self.stats())
    }

    #[must_use]
    pub fn billing_for(&self, stats: &AggregateStats) -> BillingSummary {
        BillingSummary::compute(stats.current_total, self.discount_percent, self.iss_percent)
    }

    /// Rows and stats of a closed period as they stood at close.
    #[must_use]
    pub fn snapshot_report(&self, measurement_number: u32) -> Option<WbsReport> {
        let snapshot = self.snapshot(measurement_number)?;
        let mut report = aggregate(&snapshot.items, snapshot.overhead_index);
        report.stats = snapshot.stats;
        Some(report)
    }

    /// The most recently closed period, if any.
    #[must_use]
    pub fn latest_snapshot(&self) -> Option<&MeasurementSnapshot> {
        self.history.first()
    }

    #[must_use]
    pub fn snapshot(&self, measurement_number: u32) -> Option<&MeasurementSnapshot> {
        self.history
            .iter()
            .find(|s| s.measurement_number == measurement_number)
    }
}
