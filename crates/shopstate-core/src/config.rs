//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::checkout::NewAddress;
use crate::money::{Currency, Money};

/// Default comparison-set capacity.
pub const DEFAULT_COMPARE_CAPACITY: usize = 4;

/// Configuration shared by every container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Storefront currency.
    #[serde(default)]
    pub currency: Currency,

    /// Flat shipping tiers.
    #[serde(default)]
    pub shipping: ShippingRates,

    /// Maximum number of products in the comparison set.
    #[serde(default = "default_compare_capacity")]
    pub compare_capacity: usize,

    /// Storage key per container record.
    #[serde(default)]
    pub storage: StorageKeys,

    /// Addresses placed in an address book that has never been persisted.
    #[serde(default)]
    pub seed_addresses: Vec<NewAddress>,
}

fn default_compare_capacity() -> usize {
    DEFAULT_COMPARE_CAPACITY
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            shipping: ShippingRates::default(),
            compare_capacity: DEFAULT_COMPARE_CAPACITY,
            storage: StorageKeys::default(),
            seed_addresses: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot honor.
    pub fn validate(&self) -> Result<(), crate::StateError> {
        if self.compare_capacity == 0 {
            return Err(crate::StateError::Validation(
                "compare_capacity must be at least 1".to_string(),
            ));
        }
        if self.shipping.regular_minor < 0 || self.shipping.express_minor < 0 {
            return Err(crate::StateError::Validation(
                "shipping rates must not be negative".to_string(),
            ));
        }
        let keys = self.storage.all();
        for (i, key) in keys.iter().enumerate() {
            if key.is_empty() {
                return Err(crate::StateError::Validation(
                    "storage keys must not be empty".to_string(),
                ));
            }
            if keys[i + 1..].contains(key) {
                return Err(crate::StateError::Validation(format!(
                    "storage key '{}' is used twice",
                    key
                )));
            }
        }
        Ok(())
    }
}

/// Flat shipping tiers, in minor units of the storefront currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRates {
    #[serde(default = "default_regular")]
    pub regular_minor: i64,
    #[serde(default = "default_express")]
    pub express_minor: i64,
}

fn default_regular() -> i64 {
    5_000
}

fn default_express() -> i64 {
    12_000
}

impl Default for ShippingRates {
    fn default() -> Self {
        Self {
            regular_minor: default_regular(),
            express_minor: default_express(),
        }
    }
}

impl ShippingRates {
    pub fn regular(&self, currency: Currency) -> Money {
        Money::new(self.regular_minor, currency)
    }

    pub fn express(&self, currency: Currency) -> Money {
        Money::new(self.express_minor, currency)
    }
}

/// Storage key names, one record per container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    #[serde(default = "default_cart_key")]
    pub cart: String,
    #[serde(default = "default_wishlist_key")]
    pub wishlist: String,
    #[serde(default = "default_checkout_key")]
    pub checkout: String,
    #[serde(default = "default_compare_key")]
    pub compare: String,
    #[serde(default = "default_reviews_key")]
    pub reviews: String,
}

fn default_cart_key() -> String {
    "cart-storage".to_string()
}

fn default_wishlist_key() -> String {
    "wishlist-storage".to_string()
}

fn default_checkout_key() -> String {
    "ecommerce-checkout-storage".to_string()
}

fn default_compare_key() -> String {
    "ecommerce-compare-storage".to_string()
}

fn default_reviews_key() -> String {
    "ecommerce-reviews-storage".to_string()
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            cart: default_cart_key(),
            wishlist: default_wishlist_key(),
            checkout: default_checkout_key(),
            compare: default_compare_key(),
            reviews: default_reviews_key(),
        }
    }
}

impl StorageKeys {
    pub fn all(&self) -> [&str; 5] {
        [
            &self.cart,
            &self.wishlist,
            &self.checkout,
            &self.compare,
            &self.reviews,
        ]
    }
}
