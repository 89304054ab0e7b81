//! Payment method catalog.
//!
//! The wizard only records which method the shopper picked; the gateway
//! integration lives with the external submission collaborator.

use crate::ids::PaymentMethodId;

/// A payment option offered on the payment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentOption {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Id of the cash-on-delivery option.
pub const CASH_ON_DELIVERY: &str = "cod";

/// Options offered by the storefront, in display order.
pub const PAYMENT_OPTIONS: &[PaymentOption] = &[
    PaymentOption {
        id: CASH_ON_DELIVERY,
        name: "Cash on Delivery",
        description: "Pay when you receive the product",
    },
    PaymentOption {
        id: "bkash",
        name: "bKash",
        description: "Pay via bKash mobile banking",
    },
    PaymentOption {
        id: "nagad",
        name: "Nagad",
        description: "Pay via Nagad mobile banking",
    },
    PaymentOption {
        id: "rocket",
        name: "Rocket",
        description: "Pay via Rocket mobile banking",
    },
    PaymentOption {
        id: "sslcommerz",
        name: "SSLCommerz",
        description: "Stripe / SSLCommerz Secure",
    },
    PaymentOption {
        id: "card",
        name: "Credit/Debit Card",
        description: "Visa, MasterCard, Amex",
    },
];

/// Look up a catalog entry.
pub fn payment_option(id: &PaymentMethodId) -> Option<&'static PaymentOption> {
    PAYMENT_OPTIONS.iter().find(|o| o.id == id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let option = payment_option(&PaymentMethodId::new("bkash")).unwrap();
        assert_eq!(option.name, "bKash");
        assert!(payment_option(&PaymentMethodId::new("barter")).is_none());
    }
}
