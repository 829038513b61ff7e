//! Budget arithmetic: currency units, trip budget parameters, and the
//! minimum-stay cost used by the budget gate.
//!
//! Daily subsistence minimums are per-currency economic assumptions, not
//! exchange-rate conversions of each other. Exchange rates exist separately
//! for the cases where a budget must be normalized into one reference
//! currency while being reported in another.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default per-person daily subsistence minimum in USD
pub const DEFAULT_DAILY_MINIMUM_USD: f64 = 80.0;

/// Default per-person daily subsistence minimum in INR
pub const DEFAULT_DAILY_MINIMUM_INR: f64 = 6000.0;

/// Default fixed exchange rate: 1 USD in INR
pub const DEFAULT_USD_TO_INR: f64 = 83.0;

/// Supported billing currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyUnit {
    Usd,
    Inr,
}

impl CurrencyUnit {
    /// Display symbol used in prompts and reports
    pub fn symbol(&self) -> &'static str {
        match self {
            CurrencyUnit::Usd => "$",
            CurrencyUnit::Inr => "₹",
        }
    }

    /// ISO-ish code used in config and logs
    pub fn code(&self) -> &'static str {
        match self {
            CurrencyUnit::Usd => "USD",
            CurrencyUnit::Inr => "INR",
        }
    }
}

impl std::str::FromStr for CurrencyUnit {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" | "$" => Ok(CurrencyUnit::Usd),
            "INR" | "₹" => Ok(CurrencyUnit::Inr),
            other => Err(BudgetError::UnknownCurrency(other.to_string())),
        }
    }
}

impl std::fmt::Display for CurrencyUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors from budget parameter construction
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("Unknown currency: '{0}'. Supported: USD, INR")]
    UnknownCurrency(String),

    #[error("Trip duration must be at least 1 day, got {0}")]
    InvalidDuration(u32),

    #[error("Traveler count must be at least 1, got {0}")]
    InvalidTravelers(u32),

    #[error("{field} must be a positive finite amount, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },
}

/// Validated numeric inputs for one budget evaluation
///
/// Constructed once per run via [`BudgetParameters::new`]; the constructor is
/// the only place the numeric invariants are enforced, so holders can rely
/// on them.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetParameters {
    pub currency: CurrencyUnit,
    pub ceiling: f64,
    pub duration_days: u32,
    pub travelers: u32,
    pub daily_minimum_per_person: f64,
}

impl BudgetParameters {
    pub fn new(
        currency: CurrencyUnit,
        ceiling: f64,
        duration_days: u32,
        travelers: u32,
        daily_minimum_per_person: f64,
    ) -> Result<Self, BudgetError> {
        debug!(%currency, ceiling, duration_days, travelers, "BudgetParameters::new: called");
        if duration_days < 1 {
            return Err(BudgetError::InvalidDuration(duration_days));
        }
        if travelers < 1 {
            return Err(BudgetError::InvalidTravelers(travelers));
        }
        if !ceiling.is_finite() || ceiling <= 0.0 {
            return Err(BudgetError::InvalidAmount {
                field: "budget ceiling",
                value: ceiling,
            });
        }
        if !daily_minimum_per_person.is_finite() || daily_minimum_per_person < 0.0 {
            return Err(BudgetError::InvalidAmount {
                field: "daily minimum",
                value: daily_minimum_per_person,
            });
        }
        Ok(Self {
            currency,
            ceiling,
            duration_days,
            travelers,
            daily_minimum_per_person,
        })
    }

    /// Minimum food/hotel cost for the whole group over the whole stay
    ///
    /// Pure product: `daily_minimum * duration * travelers`. Monotonic in
    /// duration and traveler count.
    pub fn minimum_stay_cost(&self) -> f64 {
        self.daily_minimum_per_person * f64::from(self.duration_days) * f64::from(self.travelers)
    }
}

/// Injectable USD↔local conversion table
///
/// Rates are supplied by configuration, never derived inside control logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeRates {
    /// How many INR one USD buys
    #[serde(rename = "usd-to-inr")]
    pub usd_to_inr: f64,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self {
            usd_to_inr: DEFAULT_USD_TO_INR,
        }
    }
}

impl ExchangeRates {
    /// Normalize an amount in `unit` into USD
    pub fn to_usd(&self, amount: f64, unit: CurrencyUnit) -> f64 {
        match unit {
            CurrencyUnit::Usd => amount,
            CurrencyUnit::Inr => amount / self.usd_to_inr,
        }
    }

    /// Express a USD amount in `unit`
    pub fn from_usd(&self, amount: f64, unit: CurrencyUnit) -> f64 {
        match unit {
            CurrencyUnit::Usd => amount,
            CurrencyUnit::Inr => amount * self.usd_to_inr,
        }
    }
}
