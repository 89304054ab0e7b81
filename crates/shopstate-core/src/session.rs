//! Composition root.
//!
//! A [`Storefront`] owns one of each container and wires them to storage
//! through a [`RepositoryProvider`]. Cross-container helpers are plain
//! sequences of single-container operations; each step persists on its own.

use crate::cart::{Cart, CartLine, NewLine};
use crate::checkout::{CheckoutWizard, OrderSummary, Transition};
use crate::compare::CompareSet;
use crate::config::EngineConfig;
use crate::ids::{LineId, ProductId};
use crate::reviews::ReviewLog;
use crate::store::{MemoryProvider, RepositoryProvider};
use crate::wishlist::{Wishlist, WishlistEntry};
use crate::StateError;

/// Every piece of shopper state, loaded and ready.
#[derive(Debug)]
pub struct Storefront {
    pub cart: Cart,
    pub checkout: CheckoutWizard,
    pub compare: CompareSet,
    pub wishlist: Wishlist,
    pub reviews: ReviewLog,
    config: EngineConfig,
}

impl Storefront {
    /// Validate `config` and hydrate every container from `provider`.
    pub fn open(config: EngineConfig, provider: &impl RepositoryProvider) -> Result<Self, StateError> {
        config.validate()?;
        let keys = &config.storage;

        let cart = Cart::load(config.currency, provider.repository(&keys.cart));
        let checkout = CheckoutWizard::load(&config, provider.repository(&keys.checkout));
        let compare = CompareSet::load(config.compare_capacity, provider.repository(&keys.compare));
        let wishlist = Wishlist::load(provider.repository(&keys.wishlist));
        let reviews = ReviewLog::load(provider.repository(&keys.reviews));

        tracing::debug!(
            cart_lines = cart.len(),
            addresses = checkout.addresses().len(),
            compare = compare.len(),
            wishlist = wishlist.len(),
            reviews = reviews.len(),
            "storefront opened"
        );

        Ok(Self {
            cart,
            checkout,
            compare,
            wishlist,
            reviews,
            config,
        })
    }

    /// A storefront whose records live only as long as the value.
    pub fn in_memory(config: EngineConfig) -> Result<Self, StateError> {
        Self::open(config, &MemoryProvider)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Advance the checkout wizard against this storefront's cart.
    pub fn advance_checkout(&mut self) -> Transition {
        self.checkout.advance(&mut self.cart)
    }

    /// Place the order: clears the cart and completes the wizard.
    pub fn finalize_checkout(&mut self) -> Transition {
        self.checkout.finalize(&mut self.cart)
    }

    pub fn order_summary(&self) -> Result<OrderSummary, StateError> {
        self.checkout.order_summary(&self.cart)
    }

    /// Save every selected line for later, then drop them from the cart.
    ///
    /// Products already on the wishlist stay as they are. Returns the lines
    /// removed from the cart.
    pub fn move_selected_to_wishlist(&mut self) -> Vec<CartLine> {
        let entries: Vec<WishlistEntry> = self.cart.selected_lines().map(wishlist_entry).collect();
        for entry in entries {
            self.wishlist.add(entry);
        }
        self.cart.remove_selected()
    }

    /// Save one line for later and drop it from the cart.
    pub fn move_line_to_wishlist(&mut self, line_id: &LineId) -> bool {
        let Some(entry) = self.cart.line(line_id).map(wishlist_entry) else {
            return false;
        };
        self.wishlist.add(entry);
        self.cart.remove(line_id)
    }

    /// Add a compared product to the cart with default attributes.
    pub fn add_compare_to_cart(&mut self, product_id: &ProductId) -> Option<LineId> {
        let entry = self.compare.entries().iter().find(|e| &e.id == product_id)?;
        let mut new = NewLine::new(entry.id.clone(), entry.name.clone(), entry.price);
        new.original_unit_price = entry.original_price;
        new.brand = entry.brand.clone();
        new.image = Some(entry.image.clone());
        new.slug = entry.slug.clone();
        Some(self.cart.add(new))
    }
}

fn wishlist_entry(line: &CartLine) -> WishlistEntry {
    WishlistEntry {
        id: line.product_id.clone(),
        name: line.name.clone(),
        price: line.unit_price,
        brand: line.brand.clone(),
        image: line.image.clone(),
        slug: line.slug.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::CompareEntry;
    use crate::money::{Currency, Money};

    fn storefront() -> Storefront {
        Storefront::in_memory(EngineConfig::default()).unwrap()
    }

    fn bdt(major: i64) -> Money {
        Money::from_major(major, Currency::BDT)
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let config = EngineConfig {
            compare_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(Storefront::in_memory(config).is_err());
    }

    #[test]
    fn test_move_selected_to_wishlist() {
        let mut store = storefront();
        let keep = store.cart.add(NewLine::new("p1", "Mouse", bdt(10)));
        let moved = store.cart.add(NewLine::new("p2", "Monitor", bdt(300)));
        store.cart.toggle_selected(&keep);

        let removed = store.move_selected_to_wishlist();

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].line_id, moved);
        assert!(store.wishlist.is_member(&ProductId::new("p2")));
        assert!(!store.wishlist.is_member(&ProductId::new("p1")));
        assert_eq!(store.cart.len(), 1);
    }

    #[test]
    fn test_move_line_to_wishlist() {
        let mut store = storefront();
        let line = store.cart.add(NewLine::new("p1", "Mouse", bdt(10)));

        assert!(store.move_line_to_wishlist(&line));
        assert!(store.cart.is_empty());
        assert_eq!(store.wishlist.len(), 1);
        assert!(!store.move_line_to_wishlist(&line));
    }

    #[test]
    fn test_add_compare_to_cart() {
        let mut store = storefront();
        store
            .compare
            .toggle(CompareEntry::new("p1", "Monitor", bdt(300), "/img/p1.png"));

        let line = store.add_compare_to_cart(&ProductId::new("p1")).unwrap();
        assert_eq!(line.as_str(), "p1::default");
        assert!(store.add_compare_to_cart(&ProductId::new("p9")).is_none());
        // The product stays in the comparison set.
        assert!(store.compare.contains(&ProductId::new("p1")));
    }

    #[test]
    fn test_summary_uses_configured_rates() {
        let mut store = storefront();
        store.cart.add(NewLine::new("p1", "Mouse", bdt(10)).with_quantity(2));

        let summary = store.order_summary().unwrap();
        assert_eq!(summary.subtotal, bdt(20));
        assert_eq!(summary.shipping, bdt(50));
        assert_eq!(summary.total, bdt(70));
    }
}
