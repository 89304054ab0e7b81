//! Side-by-side product comparison set.
//!
//! A capacity-bounded, insertion-ordered set. Adding past capacity evicts the
//! oldest entry (strict FIFO: viewing an entry never refreshes its position).

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_COMPARE_CAPACITY;
use crate::ids::ProductId;
use crate::money::Money;
use crate::store::{self, Listeners, MemoryRepository, Repository, SubscriptionId};

/// Product snapshot shown in the comparison table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompareEntry {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl CompareEntry {
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            original_price: None,
            rating: None,
            review_count: None,
            image: image.into(),
            brand: None,
            slug: None,
        }
    }
}

/// Durable comparison record, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompareState {
    pub entries: Vec<CompareEntry>,
}

/// What a [`CompareSet::toggle`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum CompareToggle {
    Added,
    /// Added after evicting the oldest entry.
    AddedWithEviction(CompareEntry),
    Removed,
}

/// The comparison set.
pub struct CompareSet {
    state: CompareState,
    capacity: usize,
    repo: Box<dyn Repository<CompareState>>,
    listeners: Listeners<CompareState>,
}

impl CompareSet {
    pub fn new(capacity: usize, repo: Box<dyn Repository<CompareState>>) -> Self {
        Self {
            state: CompareState::default(),
            capacity: capacity.max(1),
            repo,
            listeners: Listeners::new(),
        }
    }

    /// Hydrate from `repo`, keeping only the newest `capacity` entries.
    pub fn load(capacity: usize, repo: Box<dyn Repository<CompareState>>) -> Self {
        let capacity = capacity.max(1);
        let mut state = store::load_or_default(repo.as_ref(), "compare").unwrap_or_default();

        let mut seen: Vec<ProductId> = Vec::with_capacity(state.entries.len());
        state.entries.retain(|e| {
            if seen.contains(&e.id) {
                false
            } else {
                seen.push(e.id.clone());
                true
            }
        });
        let overflow = state.entries.len().saturating_sub(capacity);
        if overflow > 0 {
            tracing::warn!(overflow, capacity, "trimming oversized comparison record");
            state.entries.drain(..overflow);
        }

        Self {
            state,
            capacity,
            repo,
            listeners: Listeners::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(DEFAULT_COMPARE_CAPACITY, Box::new(MemoryRepository::new()))
    }

    /// Remove the entry if present, otherwise append it, evicting the oldest
    /// entry when the set is full.
    pub fn toggle(&mut self, entry: CompareEntry) -> CompareToggle {
        if self.remove_entry(&entry.id) {
            return CompareToggle::Removed;
        }

        let outcome = if self.state.entries.len() >= self.capacity {
            let evicted = self.state.entries.remove(0);
            tracing::debug!(evicted = %evicted.id, added = %entry.id, "comparison set full, evicted oldest");
            CompareToggle::AddedWithEviction(evicted)
        } else {
            CompareToggle::Added
        };
        self.state.entries.push(entry);
        self.commit();
        outcome
    }

    pub fn remove(&mut self, id: &ProductId) -> bool {
        self.remove_entry(id)
    }

    pub fn clear(&mut self) {
        if self.state.entries.is_empty() {
            return;
        }
        self.state.entries.clear();
        self.commit();
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.state.entries.iter().any(|e| &e.id == id)
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> &[CompareEntry] {
        &self.state.entries
    }

    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.state.entries.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> &CompareState {
        &self.state
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&CompareState) + Send + 'static,
    ) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn remove_entry(&mut self, id: &ProductId) -> bool {
        let len_before = self.state.entries.len();
        self.state.entries.retain(|e| &e.id != id);
        let removed = self.state.entries.len() < len_before;
        if removed {
            self.commit();
        }
        removed
    }

    fn commit(&mut self) {
        store::save_best_effort(self.repo.as_ref(), &self.state, "compare");
        self.listeners.notify(&self.state);
    }
}

impl std::fmt::Debug for CompareSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompareSet")
            .field("state", &self.state)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn entry(id: &str) -> CompareEntry {
        CompareEntry::new(
            id,
            format!("Product {}", id),
            Money::from_major(100, Currency::BDT),
            format!("/images/{}.png", id),
        )
    }

    fn ids(set: &CompareSet) -> Vec<&str> {
        set.entries().iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_fifth_entry_evicts_oldest() {
        let mut set = CompareSet::in_memory();
        for id in ["1", "2", "3", "4"] {
            assert_eq!(set.toggle(entry(id)), CompareToggle::Added);
        }
        assert!(set.is_full());

        let outcome = set.toggle(entry("5"));
        assert_eq!(outcome, CompareToggle::AddedWithEviction(entry("1")));
        assert_eq!(ids(&set), vec!["2", "3", "4", "5"]);
    }

    #[test]
    fn test_toggle_twice_removes() {
        let mut set = CompareSet::in_memory();
        set.toggle(entry("1"));
        assert_eq!(set.toggle(entry("1")), CompareToggle::Removed);
        assert!(set.is_empty());
    }

    #[test]
    fn test_eviction_is_fifo_not_lru() {
        let mut set = CompareSet::in_memory();
        for id in ["1", "2", "3", "4"] {
            set.toggle(entry(id));
        }
        // Looking an entry up does not refresh it.
        assert!(set.contains(&ProductId::new("1")));
        set.toggle(entry("5"));
        assert!(!set.contains(&ProductId::new("1")));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut set = CompareSet::in_memory();
        set.toggle(entry("1"));
        set.toggle(entry("2"));

        assert!(set.remove(&ProductId::new("1")));
        assert!(!set.remove(&ProductId::new("1")));
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_load_trims_to_capacity() {
        let repo = MemoryRepository::with_record(CompareState {
            entries: ["1", "2", "3", "4", "5", "5"].iter().map(|id| entry(id)).collect(),
        });
        let set = CompareSet::load(4, Box::new(repo.clone()));
        assert_eq!(ids(&set), vec!["2", "3", "4", "5"]);
    }

    #[test]
    fn test_writes_through() {
        let repo = MemoryRepository::new();
        let mut set = CompareSet::new(2, Box::new(repo.clone()));
        set.toggle(entry("1"));
        set.toggle(entry("2"));
        set.toggle(entry("3"));

        let stored = repo.stored().unwrap();
        assert_eq!(stored.entries.len(), 2);
        assert_eq!(stored.entries[0].id.as_str(), "2");
    }
}
