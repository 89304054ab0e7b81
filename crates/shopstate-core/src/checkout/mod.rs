//! Checkout module.
//!
//! Contains the checkout wizard, the address book, shipping tiers, and the
//! payment method catalog.

mod address;
mod flow;
pub mod payment;
mod shipping;

pub use address::{AddressPatch, GeoPoint, NewAddress, SavedAddress};
pub use flow::{
    BlockedReason, CheckoutCart, CheckoutRecord, CheckoutState, CheckoutStep, CheckoutWizard,
    OrderSummary, Transition,
};
pub use payment::{PaymentOption, PAYMENT_OPTIONS};
pub use shipping::ShippingMethod;
