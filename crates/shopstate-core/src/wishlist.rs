//! Saved-for-later products.

use serde::{Deserialize, Serialize};

use crate::ids::ProductId;
use crate::money::Money;
use crate::store::{self, Listeners, MemoryRepository, Repository, SubscriptionId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WishlistEntry {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl WishlistEntry {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            brand: None,
            image: None,
            slug: None,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WishlistState {
    pub entries: Vec<WishlistEntry>,
}

/// Idempotent set of products keyed by product id, in insertion order.
pub struct Wishlist {
    state: WishlistState,
    repo: Box<dyn Repository<WishlistState>>,
    listeners: Listeners<WishlistState>,
}

impl Wishlist {
    pub fn new(repo: Box<dyn Repository<WishlistState>>) -> Self {
        Self {
            state: WishlistState::default(),
            repo,
            listeners: Listeners::new(),
        }
    }

    pub fn load(repo: Box<dyn Repository<WishlistState>>) -> Self {
        let mut state = store::load_or_default(repo.as_ref(), "wishlist").unwrap_or_default();
        let mut seen: Vec<ProductId> = Vec::with_capacity(state.entries.len());
        state.entries.retain(|e| {
            if seen.contains(&e.id) {
                false
            } else {
                seen.push(e.id.clone());
                true
            }
        });
        Self {
            state,
            repo,
            listeners: Listeners::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryRepository::new()))
    }

    /// Add an entry. Returns `false` if the product is already present.
    pub fn add(&mut self, entry: WishlistEntry) -> bool {
        if self.is_member(&entry.id) {
            return false;
        }
        tracing::debug!(product = %entry.id, "added to wishlist");
        self.state.entries.push(entry);
        self.commit();
        true
    }

    pub fn remove(&mut self, id: &ProductId) -> bool {
        let len_before = self.state.entries.len();
        self.state.entries.retain(|e| &e.id != id);
        if self.state.entries.len() == len_before {
            return false;
        }
        self.commit();
        true
    }

    /// Remove if present, otherwise add. Returns whether the product is now a
    /// member.
    pub fn toggle(&mut self, entry: WishlistEntry) -> bool {
        if self.remove(&entry.id) {
            false
        } else {
            self.add(entry)
        }
    }

    pub fn is_member(&self, id: &ProductId) -> bool {
        self.state.entries.iter().any(|e| &e.id == id)
    }

    pub fn clear(&mut self) {
        if self.state.entries.is_empty() {
            return;
        }
        self.state.entries.clear();
        self.commit();
    }

    pub fn entries(&self) -> &[WishlistEntry] {
        &self.state.entries
    }

    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }

    pub fn snapshot(&self) -> &WishlistState {
        &self.state
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&WishlistState) + Send + 'static,
    ) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn commit(&mut self) {
        store::save_best_effort(self.repo.as_ref(), &self.state, "wishlist");
        self.listeners.notify(&self.state);
    }
}

impl std::fmt::Debug for Wishlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wishlist")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::money::Currency;

    fn entry(id: &str) -> WishlistEntry {
        WishlistEntry::new(id, format!("Product {}", id), Money::from_major(10, Currency::BDT))
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut wishlist = Wishlist::in_memory();
        assert!(wishlist.add(entry("p1")));
        assert!(!wishlist.add(entry("p1")));
        assert_eq!(wishlist.len(), 1);
    }

    #[test]
    fn test_toggle() {
        let mut wishlist = Wishlist::in_memory();
        assert!(wishlist.toggle(entry("p1")));
        assert!(wishlist.is_member(&ProductId::new("p1")));
        assert!(!wishlist.toggle(entry("p1")));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut wishlist = Wishlist::in_memory();
        assert!(!wishlist.remove(&ProductId::new("ghost")));
    }

    #[test]
    fn test_noop_does_not_notify() {
        let mut wishlist = Wishlist::in_memory();
        let calls = Arc::new(Mutex::new(0));
        let seen = Arc::clone(&calls);
        wishlist.subscribe(move |_| *seen.lock().unwrap() += 1);

        wishlist.add(entry("p1"));
        wishlist.add(entry("p1"));
        wishlist.remove(&ProductId::new("p2"));
        wishlist.clear();
        wishlist.clear();

        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_load_drops_duplicates() {
        let repo = MemoryRepository::with_record(WishlistState {
            entries: vec![entry("a"), entry("b"), entry("a")],
        });
        let wishlist = Wishlist::load(Box::new(repo));
        let ids: Vec<_> = wishlist.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
