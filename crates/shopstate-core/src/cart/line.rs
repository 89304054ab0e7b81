//! Cart line types.

use serde::{Deserialize, Serialize};

use crate::cart::key::{self, Attributes};
use crate::ids::{LineId, ProductId};
use crate::money::Money;

/// One distinct purchasable configuration in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// Derived identity: product plus canonical attributes.
    pub line_id: LineId,
    /// Product reference.
    pub product_id: ProductId,
    /// Product name (denormalized for display).
    pub name: String,
    /// Chosen variant attributes.
    #[serde(default)]
    pub attributes: Attributes,
    /// Quantity, always at least 1.
    pub quantity: u32,
    /// Unit price at the time the line was added.
    pub unit_price: Money,
    /// Pre-discount unit price, if the product was on sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_unit_price: Option<Money>,
    /// Whether the line participates in the checkout subtotal.
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Read-only stock flag from the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_status: Option<String>,
}

impl CartLine {
    /// Create a selected line from an add request.
    pub(crate) fn from_new(new: NewLine) -> Self {
        let line_id = key::line_id(&new.product_id, &new.attributes);
        Self {
            line_id,
            product_id: new.product_id,
            name: new.name,
            attributes: new.attributes,
            quantity: new.quantity.max(1),
            unit_price: new.unit_price,
            original_unit_price: new.original_unit_price,
            selected: true,
            brand: new.brand,
            image: new.image,
            slug: new.slug,
            stock_status: new.stock_status,
        }
    }

    /// `unit_price * quantity`.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.try_multiply(self.quantity)
    }

    /// Savings against the original price, if the line is discounted.
    pub fn savings(&self) -> Option<Money> {
        let original = self.original_unit_price?;
        let per_unit = original.try_subtract(&self.unit_price)?;
        if !per_unit.is_positive() {
            return None;
        }
        per_unit.try_multiply(self.quantity)
    }

    /// Human-readable variant label, e.g. "color: red / size: M".
    pub fn variant_label(&self) -> Option<String> {
        if self.attributes.is_empty() {
            return None;
        }
        Some(
            self.attributes
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join(" / "),
        )
    }
}

/// Request to add a product configuration to the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewLine {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Quantity to add; 0 is treated as 1.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(default)]
    pub original_unit_price: Option<Money>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub stock_status: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl NewLine {
    /// Add request for one unit with no variant attributes.
    pub fn new(product_id: impl Into<ProductId>, name: impl Into<String>, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            attributes: Attributes::new(),
            quantity: 1,
            unit_price,
            original_unit_price: None,
            brand: None,
            image: None,
            slug: None,
            stock_status: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_original_price(mut self, price: Money) -> Self {
        self.original_unit_price = Some(price);
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }
}

/// Combined attribute and quantity edit for an existing line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineUpdate {
    /// Attributes merged over the line's current ones.
    pub attributes: Option<Attributes>,
    /// Replacement quantity; 0 is treated as 1.
    pub quantity: Option<u32>,
}
