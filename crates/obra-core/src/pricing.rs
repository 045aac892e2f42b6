//! Overhead-adjusted pricing for a single item.
//!
//! An item's base price, overhead-adjusted price, and contract total are
//! mutually derived: editing any one fixes the other two for a given
//! quantity and overhead index. The editing surface works on a transient
//! [`PriceDraft`], applying one [`PriceEdit`] at a time:
//!
//! | edited field      | derived                                                   |
//! |-------------------|-----------------------------------------------------------|
//! | base price `v`    | `with = r(v × k)`, `total = r(with × qty)`                |
//! | with overhead `v` | `base = r(v / k)`, `total = r(v × qty)`                   |
//! | total `v`         | `with = r(v / qty)`, `base = r(with / k)` (only if qty>0) |
//! | quantity `v`      | `total = r(with × v)`                                     |
//!
//! where `k = 1 + overhead_index / 100` and `r` rounds to cents. Rounding
//! happens at every step so each intermediate matches what was displayed.
//!
//! [`PriceDraft::commit`] stores all three fields as reconciled. The base
//! price stays authoritative: on read, the other two are used only while they
//! still agree with it to the cent (see [`WorkItem::figures`]).

use serde::{Deserialize, Serialize};

use crate::model::item::WorkItem;
use crate::money::{overhead_factor, ratio, round2};

/// Which pricing field the user touched last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    NoOverhead,
    WithOverhead,
    Total,
    Quantity,
}

/// A single pricing edit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum PriceEdit {
    NoOverhead(f64),
    WithOverhead(f64),
    Total(f64),
    Quantity(f64),
}

impl PriceEdit {
    #[must_use]
    pub const fn field(self) -> PriceField {
        match self {
            Self::NoOverhead(_) => PriceField::NoOverhead,
            Self::WithOverhead(_) => PriceField::WithOverhead,
            Self::Total(_) => PriceField::Total,
            Self::Quantity(_) => PriceField::Quantity,
        }
    }
}

/// Pricing state of one item while it is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceDraft {
    pub overhead_index: f64,
    pub quantity: f64,
    pub no_overhead: f64,
    pub with_overhead: f64,
    pub total: f64,
    /// Never persisted; only meaningful to the editing surface.
    #[serde(skip)]
    pub last_edited: Option<PriceField>,
}

impl PriceDraft {
    /// Start a draft from a stored base price.
    #[must_use]
    pub fn new(quantity: f64, no_overhead: f64, overhead_index: f64) -> Self {
        let with_overhead = round2(no_overhead * overhead_factor(overhead_index));
        Self {
            overhead_index,
            quantity,
            no_overhead,
            with_overhead,
            total: round2(with_overhead * quantity),
            last_edited: None,
        }
    }

    /// Start a draft from an item's stored fields.
    #[must_use]
    pub fn from_item(item: &WorkItem, overhead_index: f64) -> Self {
        let figures = item.figures(overhead_index);
        Self {
            overhead_index,
            quantity: item.contract_quantity,
            no_overhead: item.unit_price_no_overhead,
            with_overhead: figures.unit_price_with_overhead,
            total: figures.contract_total,
            last_edited: None,
        }
    }

    fn factor(&self) -> f64 {
        overhead_factor(self.overhead_index)
    }

    #[must_use]
    pub fn set_price_no_overhead(&self, value: f64) -> Self {
        let with_overhead = round2(value * self.factor());
        Self {
            no_overhead: value,
            with_overhead,
            total: round2(with_overhead * self.quantity),
            last_edited: Some(PriceField::NoOverhead),
            ..*self
        }
    }

    #[must_use]
    pub fn set_price_with_overhead(&self, value: f64) -> Self {
        Self {
            no_overhead: round2(ratio(value, self.factor())),
            with_overhead: value,
            total: round2(value * self.quantity),
            last_edited: Some(PriceField::WithOverhead),
            ..*self
        }
    }

    /// Set the total and back out unit prices from it.
    ///
    /// With a zero quantity there is no unit price that produces a non-zero
    /// total, so prices are kept and the total stays at its derived value.
    #[must_use]
    pub fn set_total(&self, value: f64) -> Self {
        if self.quantity <= 0.0 {
            return Self {
                total: round2(self.with_overhead * self.quantity),
                last_edited: Some(PriceField::Total),
                ..*self
            };
        }
        let with_overhead = round2(value / self.quantity);
        Self {
            no_overhead: round2(ratio(with_overhead, self.factor())),
            with_overhead,
            total: value,
            last_edited: Some(PriceField::Total),
            ..*self
        }
    }

    #[must_use]
    pub fn set_quantity(&self, value: f64) -> Self {
        Self {
            quantity: value,
            total: round2(self.with_overhead * value),
            last_edited: Some(PriceField::Quantity),
            ..*self
        }
    }

    #[must_use]
    pub fn apply(&self, edit: PriceEdit) -> Self {
        match edit {
            PriceEdit::NoOverhead(v) => self.set_price_no_overhead(v),
            PriceEdit::WithOverhead(v) => self.set_price_with_overhead(v),
            PriceEdit::Total(v) => self.set_total(v),
            PriceEdit::Quantity(v) => self.set_quantity(v),
        }
    }

    /// Write the draft's values into a copy of `item`.
    #[must_use]
    pub fn commit(&self, item: &WorkItem) -> WorkItem {
        WorkItem {
            contract_quantity: self.quantity,
            unit_price_no_overhead: self.no_overhead,
            unit_price_with_overhead: Some(self.with_overhead),
            contract_total: Some(self.total),
            ..item.clone()
        }
    }
}
