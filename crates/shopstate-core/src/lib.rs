//! Client-held shopping state for a storefront.
//!
//! This crate owns the mutable state a shopper accumulates while browsing:
//!
//! - **Cart**: variant-keyed lines with selection and quantity rules
//! - **Checkout**: the four-step wizard, address book, shipping and payment choices
//! - **Compare**: a small FIFO set of products shown side by side
//! - **Wishlist** and **Reviews**: saved products and the shopper's own reviews
//!
//! Every container keeps its state in memory and writes a durable record
//! through a [`Repository`] after each effective mutation.
//!
//! # Example
//!
//! ```rust
//! use shopstate_core::prelude::*;
//!
//! let mut store = Storefront::in_memory(EngineConfig::default()).unwrap();
//! let price = Money::from_major(850, Currency::BDT);
//!
//! store.cart.add(NewLine::new("prod_1", "Cotton Shirt", price).with_attribute("size", "M"));
//! store.cart.add(NewLine::new("prod_1", "Cotton Shirt", price).with_attribute("size", "M"));
//! assert_eq!(store.cart.len(), 1);
//! assert_eq!(store.cart.item_count(), 2);
//!
//! assert_eq!(store.advance_checkout(), Transition::Moved(CheckoutStep::Shipping));
//! ```

pub mod cart;
pub mod checkout;
pub mod compare;
pub mod config;
pub mod error;
pub mod ids;
pub mod money;
pub mod reviews;
pub mod session;
pub mod store;
pub mod wishlist;

pub use config::EngineConfig;
pub use error::StateError;
pub use ids::*;
pub use money::{Currency, Money};
pub use session::Storefront;
pub use store::{MemoryProvider, MemoryRepository, Repository, RepositoryProvider, SubscriptionId};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{EngineConfig, ShippingRates, StorageKeys};
    pub use crate::error::StateError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};
    pub use crate::session::Storefront;
    pub use crate::store::{
        MemoryProvider, MemoryRepository, Repository, RepositoryProvider, SubscriptionId,
    };

    // Cart
    pub use crate::cart::{Attributes, Cart, CartLine, CartState, LineUpdate, NewLine};

    // Checkout
    pub use crate::checkout::{
        AddressPatch, BlockedReason, CheckoutCart, CheckoutStep, CheckoutWizard, NewAddress,
        OrderSummary, SavedAddress, ShippingMethod, Transition,
    };

    // Compare, wishlist, reviews
    pub use crate::compare::{CompareEntry, CompareSet, CompareToggle};
    pub use crate::reviews::{NewReview, Review, ReviewLog};
    pub use crate::wishlist::{Wishlist, WishlistEntry};
}
