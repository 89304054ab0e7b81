//! End-to-end shopper flows across containers.
//!
//! Each test drives a `Storefront` through the public API only and checks the
//! records written to shared in-memory repositories.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shopstate_core::prelude::*;

/// Provider that stores every record as JSON, so a second storefront opened
/// over it sees what the first one wrote.
#[derive(Clone, Default)]
struct JsonProvider {
    records: Arc<Mutex<HashMap<String, Value>>>,
}

struct JsonRepository {
    key: String,
    records: Arc<Mutex<HashMap<String, Value>>>,
}

impl<S: Serialize + DeserializeOwned + Send> Repository<S> for JsonRepository {
    fn load(&self) -> Result<Option<S>, StateError> {
        let records = self.records.lock().unwrap();
        match records.get(&self.key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    fn save(&self, record: &S) -> Result<(), StateError> {
        let value = serde_json::to_value(record)?;
        self.records.lock().unwrap().insert(self.key.clone(), value);
        Ok(())
    }
}

impl RepositoryProvider for JsonProvider {
    fn repository<S>(&self, key: &str) -> Box<dyn Repository<S>>
    where
        S: Serialize + DeserializeOwned + Clone + Send + 'static,
    {
        Box::new(JsonRepository {
            key: key.to_string(),
            records: Arc::clone(&self.records),
        })
    }
}

impl JsonProvider {
    fn record(&self, key: &str) -> Option<Value> {
        self.records.lock().unwrap().get(key).cloned()
    }
}

fn bdt(major: i64) -> Money {
    Money::from_major(major, Currency::BDT)
}

fn shirt(size: &str) -> NewLine {
    NewLine::new("prod_shirt", "Cotton Shirt", bdt(850)).with_attribute("size", size)
}

fn home_address() -> NewAddress {
    NewAddress {
        label: "Home".to_string(),
        phone: "01700000000".to_string(),
        region: "Dhaka".to_string(),
        district: "Dhaka".to_string(),
        area: "Dhanmondi".to_string(),
        full_address: "House 12, Road 5".to_string(),
        ..NewAddress::default()
    }
}

#[test]
fn merge_then_remove_selected_scenario() {
    let mut cart = Cart::in_memory(Currency::BDT);

    let medium = cart.add(shirt("M"));
    assert_eq!(cart.len(), 1);
    cart.add(shirt("M").with_quantity(2));
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.line(&medium).unwrap().quantity, 3);

    let large = cart.add(shirt("L"));
    assert_eq!(cart.len(), 2);

    // Keep the medium line out of the bulk removal.
    cart.toggle_selected(&medium);
    let removed = cart.remove_selected();

    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].line_id, large);
    assert!(cart.line(&medium).is_some());
    assert!(cart.line(&large).is_none());
}

#[test]
fn variant_change_merges_into_existing_line() {
    let mut store = Storefront::in_memory(EngineConfig::default()).unwrap();

    let medium = store.cart.add(shirt("M"));
    store.cart.add(shirt("M"));
    let large = store.cart.add(shirt("L"));
    assert_eq!(store.cart.len(), 2);

    let mut to_medium = Attributes::new();
    to_medium.insert("size".to_string(), "M".to_string());
    assert!(store.cart.update_variant(&large, to_medium));

    assert_eq!(store.cart.len(), 1);
    assert_eq!(store.cart.line(&medium).unwrap().quantity, 3);
    assert!(store.cart.line(&large).is_none());
}

#[test]
fn full_checkout_clears_cart_and_keeps_address_book() {
    let provider = JsonProvider::default();
    let config = EngineConfig::default();
    let mut store = Storefront::open(config.clone(), &provider).unwrap();

    store.cart.add(shirt("M"));
    let address = store.checkout.add_address(home_address());

    assert_eq!(store.advance_checkout(), Transition::Moved(CheckoutStep::Shipping));
    store.checkout.set_shipping_method(ShippingMethod::Express);
    assert_eq!(store.advance_checkout(), Transition::Moved(CheckoutStep::Payment));

    assert_eq!(
        store.advance_checkout(),
        Transition::Blocked(BlockedReason::NoPaymentMethodSelected)
    );
    store.checkout.set_payment_method("bkash");

    let summary = store.order_summary().unwrap();
    assert_eq!(summary.total, bdt(850 + 120));

    assert_eq!(store.finalize_checkout(), Transition::Moved(CheckoutStep::Complete));
    assert!(store.cart.is_empty());

    // Only the address book is durable; the session starts over.
    let reopened = Storefront::open(config, &provider).unwrap();
    assert_eq!(reopened.checkout.active_step(), CheckoutStep::Review);
    assert_eq!(reopened.checkout.selected_address_id(), Some(&address));
    assert!(reopened.checkout.payment_method().is_none());
    assert!(reopened.cart.is_empty());

    let record = provider.record("ecommerce-checkout-storage").unwrap();
    let mut fields: Vec<_> = record.as_object().unwrap().keys().cloned().collect();
    fields.sort();
    assert_eq!(fields, vec!["saved_addresses", "selected_address_id"]);
}

#[test]
fn blocked_without_selection_or_address() {
    let mut store = Storefront::in_memory(EngineConfig::default()).unwrap();
    assert_eq!(
        store.advance_checkout(),
        Transition::Blocked(BlockedReason::EmptySelection)
    );

    let line = store.cart.add(shirt("S"));
    store.cart.toggle_selected(&line);
    assert_eq!(
        store.advance_checkout(),
        Transition::Blocked(BlockedReason::EmptySelection)
    );

    store.cart.toggle_selected(&line);
    store.advance_checkout();
    assert_eq!(
        store.advance_checkout(),
        Transition::Blocked(BlockedReason::NoAddressSelected)
    );
    assert_eq!(store.checkout.active_step(), CheckoutStep::Shipping);
}

#[test]
fn compare_fifth_product_evicts_first_and_persists() {
    let provider = JsonProvider::default();
    let mut store = Storefront::open(EngineConfig::default(), &provider).unwrap();

    for n in 1..=5 {
        let id = format!("prod_{}", n);
        store.compare.toggle(CompareEntry::new(
            id.as_str(),
            format!("Monitor {}", n),
            bdt(300),
            format!("/images/{}.png", id),
        ));
    }

    let record = provider.record("ecommerce-compare-storage").unwrap();
    let ids: Vec<_> = record["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["prod_2", "prod_3", "prod_4", "prod_5"]);
}

#[test]
fn wishlist_and_cart_survive_reopen() {
    let provider = JsonProvider::default();
    {
        let mut store = Storefront::open(EngineConfig::default(), &provider).unwrap();
        store.cart.add(shirt("M"));
        store.cart.add(NewLine::new("prod_mouse", "Mouse", bdt(15)));
        let mouse = LineId::new("prod_mouse::default");
        store.cart.toggle_selected(&mouse);
        store.move_selected_to_wishlist();
    }

    let store = Storefront::open(EngineConfig::default(), &provider).unwrap();
    assert_eq!(store.cart.len(), 1);
    assert!(store.cart.line(&LineId::new("prod_mouse::default")).is_some());
    assert!(store.wishlist.is_member(&ProductId::new("prod_shirt")));
}
