//! Supply forecasts and the financial ledger.
//!
//! Procurement records what is expected to be bought; the ledger records what
//! is owed or paid. [`forecast_to_ledger`] links the two without either side
//! knowing about the measurement engine.

use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::money::round2;

/// Payment status shared by forecasts and ledger entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl PaymentState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
        }
    }
}

impl std::str::FromStr for PaymentState {
    type Err = crate::model::item::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            other => Err(crate::model::item::ParseEnumError {
                expected: "payment state",
                got: other.to_string(),
            }),
        }
    }
}

/// Expected purchase of materials or services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyForecast {
    pub id: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub payment_state: PaymentState,
}

/// One line of the financial ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub payment_state: PaymentState,
    /// Forecast this entry was generated from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_forecast_id: Option<String>,
}

/// Turn a forecast into a ledger entry.
///
/// `amount = quantity × unit_price`, rounded to cents. Without an explicit
/// category the configured default category is used.
#[must_use]
pub fn forecast_to_ledger(
    forecast: &SupplyForecast,
    category: Option<&str>,
    config: &LedgerConfig,
) -> LedgerEntry {
    let category = category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(config.default_category.as_str());

    LedgerEntry {
        description: forecast.description.clone(),
        category: category.to_string(),
        amount: round2(forecast.quantity * forecast.unit_price),
        payment_state: forecast.payment_state,
        source_forecast_id: Some(forecast.id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(state: PaymentState) -> SupplyForecast {
        SupplyForecast {
            id: "fc-1".to_string(),
            description: "Cement CP-II, 50kg bags".to_string(),
            quantity: 120.0,
            unit_price: 32.5,
            payment_state: state,
        }
    }

    #[test]
    fn amount_is_quantity_times_price() {
        let entry = forecast_to_ledger(
            &forecast(PaymentState::Pending),
            Some("Materials"),
            &LedgerConfig::default(),
        );
        assert_eq!(entry.amount, 3900.0);
        assert_eq!(entry.category, "Materials");
        assert_eq!(entry.description, "Cement CP-II, 50kg bags");
        assert_eq!(entry.source_forecast_id.as_deref(), Some("fc-1"));
    }

    #[test]
    fn payment_state_is_inherited() {
        let entry =
            forecast_to_ledger(&forecast(PaymentState::Paid), None, &LedgerConfig::default());
        assert_eq!(entry.payment_state, PaymentState::Paid);
    }

    #[test]
    fn missing_category_uses_configured_default() {
        let config = LedgerConfig {
            default_category: "Procurement".to_string(),
        };
        let entry = forecast_to_ledger(&forecast(PaymentState::Pending), None, &config);
        assert_eq!(entry.category, "Procurement");

        let entry = forecast_to_ledger(&forecast(PaymentState::Pending), Some("  "), &config);
        assert_eq!(entry.category, "Procurement");
    }

    #[test]
    fn payment_state_parses() {
        assert_eq!("PAID".parse::<PaymentState>(), Ok(PaymentState::Paid));
        assert!("refunded".parse::<PaymentState>().is_err());
    }
}
