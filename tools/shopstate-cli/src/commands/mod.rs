//! CLI command implementations.

pub mod cart;
pub mod checkout;
pub mod compare;
pub mod config;
pub mod reviews;
pub mod wishlist;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use shopstate_core::{Currency, Money};

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: CartCommand,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// List cart lines.
    List,
    /// Add a product configuration; identical configurations merge.
    Add {
        /// Product ID.
        product: String,
        /// Product name.
        #[arg(short, long)]
        name: String,
        /// Unit price in major units, e.g. 850 or 12.50.
        #[arg(short, long)]
        price: String,
        /// Pre-discount unit price.
        #[arg(long)]
        original_price: Option<String>,
        /// Variant attribute, repeatable (e.g. --attr size=M).
        #[arg(short, long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
        /// Quantity.
        #[arg(short, long, default_value = "1")]
        quantity: u32,
        /// Brand name.
        #[arg(long)]
        brand: Option<String>,
    },
    /// Remove a line.
    Remove {
        /// Line ID.
        line: String,
    },
    /// Increase a line's quantity by one.
    Inc {
        /// Line ID.
        line: String,
    },
    /// Decrease a line's quantity by one (never below 1).
    Dec {
        /// Line ID.
        line: String,
    },
    /// Flip a line's checkout selection.
    Toggle {
        /// Line ID.
        line: String,
    },
    /// Select every line, or deselect with --none.
    SelectAll {
        /// Deselect instead.
        #[arg(long)]
        none: bool,
    },
    /// Remove every selected line.
    RemoveSelected,
    /// Change a line's attributes and/or quantity.
    Variant {
        /// Line ID.
        line: String,
        /// Attribute to set, repeatable.
        #[arg(short, long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
        /// Replacement quantity.
        #[arg(short, long)]
        quantity: Option<u32>,
    },
    /// Empty the cart.
    Clear {
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    #[command(subcommand)]
    pub command: CheckoutCommand,
}

#[derive(Subcommand)]
pub enum CheckoutCommand {
    /// Show the order summary and anything blocking checkout.
    Preview {
        /// Shipping tier to price (regular or express).
        #[arg(short, long)]
        shipping: Option<String>,
    },
    /// Walk the checkout wizard and place the order.
    Place {
        /// Address ID to ship to (default: the selected address).
        #[arg(short, long)]
        address: Option<String>,
        /// Shipping tier (regular or express).
        #[arg(short, long)]
        shipping: Option<String>,
        /// Payment method ID (e.g. cod, bkash).
        #[arg(short, long)]
        payment: Option<String>,
        /// Do not prompt; fail on any missing choice.
        #[arg(short, long)]
        yes: bool,
    },
    /// Manage the address book.
    Address {
        #[command(subcommand)]
        command: AddressCommand,
    },
}

/// Address fields shared by `add` and `edit`.
#[derive(Args, Default)]
pub struct AddressFields {
    /// Label, e.g. Home or Office.
    #[arg(long)]
    pub label: Option<String>,
    /// Contact phone.
    #[arg(long)]
    pub phone: Option<String>,
    /// Region or division.
    #[arg(long)]
    pub region: Option<String>,
    /// District.
    #[arg(long)]
    pub district: Option<String>,
    /// Area or neighbourhood.
    #[arg(long)]
    pub area: Option<String>,
    /// Street address.
    #[arg(long)]
    pub full_address: Option<String>,
    /// Map pin latitude.
    #[arg(long, requires = "lng")]
    pub lat: Option<f64>,
    /// Map pin longitude.
    #[arg(long, requires = "lat")]
    pub lng: Option<f64>,
}

#[derive(Subcommand)]
pub enum AddressCommand {
    /// List saved addresses.
    List,
    /// Add an address and select it.
    Add {
        #[command(flatten)]
        fields: AddressFields,
    },
    /// Edit fields of a saved address.
    Edit {
        /// Address ID.
        id: String,
        #[command(flatten)]
        fields: AddressFields,
    },
    /// Delete a saved address.
    Delete {
        /// Address ID.
        id: String,
    },
    /// Select the address to ship to.
    Select {
        /// Address ID.
        id: String,
    },
}

/// Arguments for the compare command.
#[derive(Args)]
pub struct CompareArgs {
    #[command(subcommand)]
    pub command: CompareCommand,
}

#[derive(Subcommand)]
pub enum CompareCommand {
    /// List compared products, oldest first.
    List,
    /// Add a product, or remove it if already compared.
    Toggle {
        /// Product ID.
        product: String,
        /// Product name.
        #[arg(short, long)]
        name: String,
        /// Price in major units.
        #[arg(short, long)]
        price: String,
        /// Image path or URL.
        #[arg(short, long, default_value = "")]
        image: String,
        /// Pre-discount price.
        #[arg(long)]
        original_price: Option<String>,
        /// Average rating.
        #[arg(long)]
        rating: Option<f32>,
        /// Brand name.
        #[arg(long)]
        brand: Option<String>,
    },
    /// Remove a product.
    Remove {
        /// Product ID.
        product: String,
    },
    /// Move a compared product into the cart.
    ToCart {
        /// Product ID.
        product: String,
    },
    /// Remove every product.
    Clear,
}

/// Arguments for the wishlist command.
#[derive(Args)]
pub struct WishlistArgs {
    #[command(subcommand)]
    pub command: WishlistCommand,
}

#[derive(Subcommand)]
pub enum WishlistCommand {
    /// List saved products.
    List,
    /// Save a product.
    Add {
        /// Product ID.
        product: String,
        /// Product name.
        #[arg(short, long)]
        name: String,
        /// Price in major units.
        #[arg(short, long)]
        price: String,
        /// Brand name.
        #[arg(long)]
        brand: Option<String>,
        /// Image path or URL.
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a saved product.
    Remove {
        /// Product ID.
        product: String,
    },
    /// Remove every saved product.
    Clear,
    /// Move the selected cart lines to the wishlist.
    MoveSelected,
    /// Move one cart line to the wishlist.
    MoveLine {
        /// Line ID.
        line: String,
    },
}

/// Arguments for the reviews command.
#[derive(Args)]
pub struct ReviewsArgs {
    #[command(subcommand)]
    pub command: ReviewsCommand,
}

#[derive(Subcommand)]
pub enum ReviewsCommand {
    /// List reviews, newest first.
    List {
        /// Only reviews of this product.
        #[arg(long)]
        product: Option<String>,
    },
    /// Write a review.
    Add {
        /// Product ID.
        product: String,
        /// Product name.
        #[arg(short, long)]
        name: String,
        /// Rating from 1 to 5.
        #[arg(short, long)]
        rating: u8,
        /// Review text.
        #[arg(short, long, default_value = "")]
        comment: String,
        /// Product image path or URL.
        #[arg(long, default_value = "")]
        image: String,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}

/// Parse `key=value` into an attribute pair.
pub fn parse_attribute(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(format!("expected key=value, got '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse a non-negative major-unit amount such as `850` or `12.5`.
pub fn parse_price(input: &str, currency: Currency) -> Result<Money> {
    let input = input.trim();
    let (major, fraction) = input.split_once('.').unwrap_or((input, ""));

    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if major.is_empty() || !digits_only(major) || !digits_only(fraction) || fraction.len() > 2 {
        bail!("Invalid price '{}': expected a non-negative amount like 850 or 12.50", input);
    }

    let major: i64 = major.parse()?;
    let minor: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>()? * 10,
        _ => fraction.parse()?,
    };

    let amount = major
        .checked_mul(currency.minor_per_major())
        .and_then(|m| m.checked_add(minor))
        .ok_or_else(|| anyhow::anyhow!("Price '{}' is too large", input))?;
    Ok(Money::new(amount, currency))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attribute() {
        assert_eq!(
            parse_attribute("size=M"),
            Ok(("size".to_string(), "M".to_string()))
        );
        assert!(parse_attribute("size").is_err());
        assert!(parse_attribute("=M").is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(
            parse_price("850", Currency::BDT).unwrap(),
            Money::new(85_000, Currency::BDT)
        );
        assert_eq!(
            parse_price("12.5", Currency::USD).unwrap(),
            Money::new(1_250, Currency::USD)
        );
        assert_eq!(
            parse_price("0.05", Currency::USD).unwrap(),
            Money::new(5, Currency::USD)
        );
    }

    #[test]
    fn test_parse_price_rejects_garbage() {
        for input in ["", "-5", "1.234", "abc", "1.2.3", ".5"] {
            assert!(parse_price(input, Currency::BDT).is_err(), "accepted {:?}", input);
        }
    }
}
