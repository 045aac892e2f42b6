use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ValidationError;
use crate::money::{overhead_factor, percent, ratio, round2, same_cents};
use crate::tree::{ParentLinked, TreeNode};

/// The two kinds of node in a work breakdown structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Grouping node. Carries no quantity or price; totals roll up from items.
    Category,
    /// Priced budget line.
    Item,
}

impl ItemType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Item => "item",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for ItemType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" | "cat" => Ok(Self::Category),
            "item" => Ok(Self::Item),
            other => Err(ParseEnumError {
                expected: "item type",
                got: other.to_string(),
            }),
        }
    }
}

/// A validated node of the work breakdown structure.
///
/// The base price and quantity are authoritative. The overhead-adjusted unit
/// price and contract total are kept as entered only while they still agree
/// with the base price to the cent; otherwise they, along with accumulated and
/// balance figures, are derived on read (see [`ItemFigures`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub item_type: ItemType,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub source_code: String,
    #[serde(default)]
    pub contract_quantity: f64,
    #[serde(default)]
    pub unit_price_no_overhead: f64,
    /// Overhead-adjusted price as last entered or reconciled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price_with_overhead: Option<f64>,
    /// Contract total as last entered or reconciled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_total: Option<f64>,
    #[serde(default)]
    pub previous_quantity: f64,
    #[serde(default)]
    pub previous_total: f64,
    #[serde(default)]
    pub current_quantity: f64,
    #[serde(default)]
    pub current_total: f64,
}

impl WorkItem {
    /// A new, empty category.
    #[must_use]
    pub fn category(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            item_type: ItemType::Category,
            order: 0,
            description: description.into(),
            unit: String::new(),
            source_code: String::new(),
            contract_quantity: 0.0,
            unit_price_no_overhead: 0.0,
            unit_price_with_overhead: None,
            contract_total: None,
            previous_quantity: 0.0,
            previous_total: 0.0,
            current_quantity: 0.0,
            current_total: 0.0,
        }
    }

    /// A new priced item with zeroed progress.
    #[must_use]
    pub fn item(
        id: impl Into<String>,
        description: impl Into<String>,
        contract_quantity: f64,
        unit_price_no_overhead: f64,
    ) -> Self {
        Self {
            item_type: ItemType::Item,
            contract_quantity,
            unit_price_no_overhead,
            ..Self::category(id, description)
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub const fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn is_category(&self) -> bool {
        self.item_type == ItemType::Category
    }

    /// Whether anything was measured on this item in the open period.
    #[must_use]
    pub fn has_current_progress(&self) -> bool {
        self.item_type == ItemType::Item
            && (self.current_quantity != 0.0 || self.current_total != 0.0)
    }

    /// Derive the full set of pricing and progress figures for an item.
    ///
    /// Categories yield all-zero figures; their totals come from the
    /// aggregator instead.
    #[must_use]
    pub fn figures(&self, overhead_index: f64) -> ItemFigures {
        if self.is_category() {
            return ItemFigures::default();
        }

        let factor = overhead_factor(overhead_index);
        let unit_price_with_overhead = self
            .unit_price_with_overhead
            .filter(|&w| same_cents(ratio(w, factor), self.unit_price_no_overhead))
            .unwrap_or_else(|| round2(self.unit_price_no_overhead * factor));
        let contract_total = self
            .contract_total
            .filter(|&t| {
                self.contract_quantity > 0.0
                    && same_cents(t / self.contract_quantity, unit_price_with_overhead)
            })
            .unwrap_or_else(|| round2(unit_price_with_overhead * self.contract_quantity));
        let accumulated_quantity = self.previous_quantity + self.current_quantity;
        let accumulated_total = round2(self.previous_total + self.current_total);

        ItemFigures {
            unit_price_with_overhead,
            contract_total,
            current_percentage: percent(self.current_quantity, self.contract_quantity),
            accumulated_quantity,
            accumulated_total,
            accumulated_percentage: percent(accumulated_quantity, self.contract_quantity),
            balance_quantity: self.contract_quantity - accumulated_quantity,
            balance_total: round2(contract_total - accumulated_total),
        }
    }
}

impl ParentLinked for WorkItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

impl TreeNode for WorkItem {
    fn order(&self) -> i64 {
        self.order
    }
}

/// Values derived from a [`WorkItem`] and the project overhead index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemFigures {
    pub unit_price_with_overhead: f64,
    pub contract_total: f64,
    pub current_percentage: f64,
    pub accumulated_quantity: f64,
    pub accumulated_total: f64,
    pub accumulated_percentage: f64,
    pub balance_quantity: f64,
    pub balance_total: f64,
}

/// A work item as supplied by the persistence collaborator, before validation.
///
/// Numeric fields are optional so a missing value on an item, or a stray
/// value on a category, can be reported instead of silently defaulted.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkItemRecord {
    pub id: String,
    pub parent_id: Option<String>,
    pub item_type: Option<ItemType>,
    pub order: i64,
    pub description: String,
    pub unit: String,
    pub source_code: String,
    pub contract_quantity: Option<f64>,
    pub unit_price_no_overhead: Option<f64>,
    pub unit_price_with_overhead: Option<f64>,
    pub contract_total: Option<f64>,
    pub previous_quantity: Option<f64>,
    pub previous_total: Option<f64>,
    pub current_quantity: Option<f64>,
    pub current_total: Option<f64>,
}

impl TryFrom<WorkItemRecord> for WorkItem {
    type Error = ValidationError;

    fn try_from(record: WorkItemRecord) -> Result<Self, Self::Error> {
        let id = record.id.clone();
        let item_type = record.item_type.ok_or_else(|| ValidationError::MissingField {
            item_id: id.clone(),
            field: "item_type",
        })?;

        let numeric = [
            ("contract_quantity", record.contract_quantity),
            ("unit_price_no_overhead", record.unit_price_no_overhead),
            ("unit_price_with_overhead", record.unit_price_with_overhead),
            ("contract_total", record.contract_total),
            ("previous_quantity", record.previous_quantity),
            ("previous_total", record.previous_total),
            ("current_quantity", record.current_quantity),
            ("current_total", record.current_total),
        ];

        match item_type {
            ItemType::Category => {
                if let Some((field, _)) = numeric.iter().find(|(_, v)| v.is_some()) {
                    return Err(ValidationError::CategoryHasPricing { item_id: id, field });
                }
            }
            ItemType::Item => {
                for (field, value) in &numeric {
                    check_number(&id, field, *value)?;
                }
                if record.contract_quantity.is_none() {
                    return Err(ValidationError::MissingField {
                        item_id: id,
                        field: "contract_quantity",
                    });
                }
                if record.unit_price_no_overhead.is_none() {
                    return Err(ValidationError::MissingField {
                        item_id: id,
                        field: "unit_price_no_overhead",
                    });
                }
            }
        }

        Ok(Self {
            id: record.id,
            parent_id: record.parent_id.filter(|p| !p.is_empty()),
            item_type,
            order: record.order,
            description: record.description,
            unit: record.unit,
            source_code: record.source_code,
            contract_quantity: record.contract_quantity.unwrap_or(0.0),
            unit_price_no_overhead: record.unit_price_no_overhead.unwrap_or(0.0),
            unit_price_with_overhead: record.unit_price_with_overhead,
            contract_total: record.contract_total,
            previous_quantity: record.previous_quantity.unwrap_or(0.0),
            previous_total: record.previous_total.unwrap_or(0.0),
            current_quantity: record.current_quantity.unwrap_or(0.0),
            current_total: record.current_total.unwrap_or(0.0),
        })
    }
}

impl From<&WorkItem> for WorkItemRecord {
    /// Storage form of an item. Categories carry no numeric fields.
    fn from(item: &WorkItem) -> Self {
        let numbers = (item.item_type == ItemType::Item).then_some(item);
        Self {
            id: item.id.clone(),
            parent_id: item.parent_id.clone(),
            item_type: Some(item.item_type),
            order: item.order,
            description: item.description.clone(),
            unit: item.unit.clone(),
            source_code: item.source_code.clone(),
            contract_quantity: numbers.map(|i| i.contract_quantity),
            unit_price_no_overhead: numbers.map(|i| i.unit_price_no_overhead),
            unit_price_with_overhead: numbers.and_then(|i| i.unit_price_with_overhead),
            contract_total: numbers.and_then(|i| i.contract_total),
            previous_quantity: numbers.map(|i| i.previous_quantity),
            previous_total: numbers.map(|i| i.previous_total),
            current_quantity: numbers.map(|i| i.current_quantity),
            current_total: numbers.map(|i| i.current_total),
        }
    }
}

/// Validate a batch of records, rejecting duplicate ids.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered, in input order.
pub fn validate_records(records: Vec<WorkItemRecord>) -> Result<Vec<WorkItem>, ValidationError> {
    let mut seen = std::collections::HashSet::new();
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id.clone()) {
            return Err(ValidationError::DuplicateId(record.id));
        }
        items.push(WorkItem::try_from(record)?);
    }
    Ok(items)
}

fn check_number(
    item_id: &str,
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    let Some(value) = value else {
        return Ok(());
    };
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            item_id: item_id.to_string(),
            field,
        });
    }
    // Progress can be negative when a previous over-measurement is corrected.
    let must_be_non_negative = matches!(
        field,
        "contract_quantity" | "unit_price_no_overhead" | "unit_price_with_overhead"
    );
    if must_be_non_negative && value < 0.0 {
        return Err(ValidationError::Negative {
            item_id: item_id.to_string(),
            field,
            value,
        });
    }
    Ok(())
}
