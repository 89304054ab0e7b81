//! CLI configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shopstate_core::EngineConfig;

/// Default directory for persisted records, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = ".shopstate";

/// Config file names searched from the working directory upward.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["shopstate.toml", ".shopstate.toml", "shopstate.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Where and how records are stored.
    #[serde(default)]
    pub store: StoreConfig,

    /// Engine settings shared by every container.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per record.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Optional key prefix, so several shoppers can share one directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            namespace: None,
        }
    }
}

/// Generate a default shopstate.toml config file.
pub fn generate_default_config() -> String {
    r#"# Shopstate configuration

[store]
data_dir = ".shopstate"
# namespace = "guest"

[engine]
currency = "BDT"
compare_capacity = 4

[engine.shipping]
# Flat rates in minor units (poisha for BDT)
regular_minor = 5000
express_minor = 12000

[engine.storage]
cart = "cart-storage"
wishlist = "wishlist-storage"
checkout = "ecommerce-checkout-storage"
compare = "ecommerce-compare-storage"
reviews = "ecommerce-reviews-storage"

# Addresses placed in a fresh address book
# [[engine.seed_addresses]]
# label = "Home"
# phone = "01700000000"
# region = "Dhaka"
# district = "Dhaka"
# area = "Dhanmondi"
# full_address = "House 12, Road 5"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopstate_core::Currency;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: CliConfig = toml::from_str(
            r#"
            [engine]
            currency = "USD"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.currency, Currency::USD);
        assert_eq!(config.engine.compare_capacity, 4);
        assert_eq!(config.store.data_dir, DEFAULT_DATA_DIR);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shopstate.json");
        std::fs::write(&path, r#"{"store": {"namespace": "guest"}}"#).unwrap();

        let config = CliConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.store.namespace.as_deref(), Some("guest"));
        assert_eq!(config.store.data_dir, DEFAULT_DATA_DIR);
        assert_eq!(config.engine, EngineConfig::default());
    }
}
