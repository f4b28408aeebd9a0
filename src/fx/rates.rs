//! USD-based rate table and amount conversion.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

/// Currency every offer is normalized to.
pub const BASE_CURRENCY: &str = "USD";

/// Exchange rates keyed by ISO currency code, expressed as units per 1 USD.
///
/// Lives for a single request. An empty table means the rate source was
/// unavailable; only USD amounts convert in that case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Creates a table from a currency → rate mapping.
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    /// Creates an empty table used when the rate source failed.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Returns the rate for a currency, if known and usable.
    pub fn rate(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied().filter(|r| r.is_finite() && *r > 0.0)
    }

    /// Returns the number of known rates.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if no rates are known.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Converts an amount to USD, rounded to cents.
    ///
    /// Returns `None` when either input is missing or no rate exists for the
    /// currency. Never guesses a rate.
    pub fn to_usd(&self, amount: Option<f64>, currency: Option<&str>) -> Option<f64> {
        let amount = amount.filter(|a| a.is_finite())?;
        let currency = currency.filter(|c| !c.is_empty())?;

        if currency == BASE_CURRENCY {
            return Some(round_cents(amount));
        }

        let rate = self.rate(currency)?;
        Some(round_cents(amount * (1.0 / rate)))
    }
}

impl FromIterator<(String, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Rounds to two decimal places using the exact decimal value of `value`.
///
/// Only true half-cents round away from zero, so 2.675 (stored as
/// 2.67499...) becomes 2.67 while 0.125 becomes 0.13.
pub fn round_cents(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
