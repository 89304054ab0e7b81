//! Shipping tiers.

use serde::{Deserialize, Serialize};

use crate::config::ShippingRates;
use crate::money::{Currency, Money};

/// Flat-rate shipping tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    #[default]
    Regular,
    Express,
}

impl ShippingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Regular => "regular",
            ShippingMethod::Express => "express",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ShippingMethod::Regular => "Regular Delivery",
            ShippingMethod::Express => "Express Delivery",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "regular" => Some(ShippingMethod::Regular),
            "express" => Some(ShippingMethod::Express),
            _ => None,
        }
    }

    /// Cost of this tier under the given rates. Pure; no step dependency.
    pub fn cost(&self, rates: &ShippingRates, currency: Currency) -> Money {
        match self {
            ShippingMethod::Regular => rates.regular(currency),
            ShippingMethod::Express => rates.express(currency),
        }
    }
}

impl std::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_costs() {
        let rates = ShippingRates::default();
        assert_eq!(
            ShippingMethod::Regular.cost(&rates, Currency::BDT),
            Money::from_major(50, Currency::BDT)
        );
        assert_eq!(
            ShippingMethod::Express.cost(&rates, Currency::BDT),
            Money::from_major(120, Currency::BDT)
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(ShippingMethod::parse("Express"), Some(ShippingMethod::Express));
        assert_eq!(ShippingMethod::parse("drone"), None);
    }
}
