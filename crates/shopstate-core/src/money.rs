//! Money type for representing monetary values.
//!
//! Uses minor-unit integer representation (paisa, cents) to avoid
//! floating-point precision issues in subtotal arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    BDT,
    USD,
    EUR,
    GBP,
    INR,
}

impl Currency {
    /// Get the currency code (e.g., "BDT").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::BDT => "BDT",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::INR => "INR",
        }
    }

    /// Get the currency symbol (e.g., "৳").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::BDT => "\u{09f3}",
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::INR => "\u{20b9}",
        }
    }

    /// Number of minor units per major unit.
    pub fn minor_per_major(&self) -> i64 {
        100
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "BDT" => Some(Currency::BDT),
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "INR" => Some(Currency::INR),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in the smallest currency unit.
    pub amount_minor: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from minor units.
    pub fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// Create a Money value from whole major units (e.g. `50` taka).
    pub fn from_major(amount: i64, currency: Currency) -> Self {
        Self::new(amount.saturating_mul(currency.minor_per_major()), currency)
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount_minor > 0
    }

    /// Try to add another Money value.
    ///
    /// Returns `None` on currency mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        let amount = self.amount_minor.checked_add(other.amount_minor)?;
        Some(Money::new(amount, self.currency))
    }

    /// Try to subtract another Money value.
    pub fn try_subtract(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        let amount = self.amount_minor.checked_sub(other.amount_minor)?;
        Some(Money::new(amount, self.currency))
    }

    /// Multiply by a quantity, returning `None` on overflow.
    pub fn try_multiply(&self, quantity: u32) -> Option<Money> {
        let amount = self.amount_minor.checked_mul(i64::from(quantity))?;
        Some(Money::new(amount, self.currency))
    }

    /// Sum an iterator of Money values, starting from zero in `currency`.
    pub fn try_sum<'a>(mut iter: impl Iterator<Item = &'a Money>, currency: Currency) -> Option<Money> {
        iter.try_fold(Money::zero(currency), |acc, m| acc.try_add(m))
    }

    /// Format as a display string (e.g., "৳1250.00").
    pub fn display(&self) -> String {
        let per = self.currency.minor_per_major().unsigned_abs();
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        format!(
            "{}{}{}.{:02}",
            sign,
            self.currency.symbol(),
            abs / per,
            abs % per
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_major() {
        let m = Money::from_major(50, Currency::BDT);
        assert_eq!(m.amount_minor, 5000);
        assert_eq!(m.currency, Currency::BDT);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(4999, Currency::USD).display(), "$49.99");
        assert_eq!(Money::from_major(120, Currency::BDT).display(), "\u{09f3}120.00");
        assert_eq!(Money::new(-250, Currency::USD).display(), "-$2.50");
    }

    #[test]
    fn test_try_add_rejects_currency_mismatch() {
        let bdt = Money::new(1000, Currency::BDT);
        let usd = Money::new(1000, Currency::USD);
        assert_eq!(bdt.try_add(&usd), None);
        assert_eq!(bdt.try_add(&bdt).map(|m| m.amount_minor), Some(2000));
    }

    #[test]
    fn test_try_multiply_overflow() {
        let m = Money::new(i64::MAX, Currency::BDT);
        assert_eq!(m.try_multiply(2), None);
        assert_eq!(Money::new(250, Currency::BDT).try_multiply(3).unwrap().amount_minor, 750);
    }

    #[test]
    fn test_try_sum() {
        let values = [Money::new(100, Currency::BDT), Money::new(250, Currency::BDT)];
        let total = Money::try_sum(values.iter(), Currency::BDT).unwrap();
        assert_eq!(total.amount_minor, 350);
        assert!(Money::try_sum(std::iter::empty(), Currency::BDT).unwrap().is_zero());
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("bdt"), Some(Currency::BDT));
        assert_eq!(Currency::from_code("INVALID"), None);
    }
}
