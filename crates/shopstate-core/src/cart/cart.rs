//! Cart engine.

use serde::{Deserialize, Serialize};

use crate::cart::key::{self, Attributes};
use crate::cart::{CartLine, LineUpdate, NewLine};
use crate::error::StateError;
use crate::ids::LineId;
use crate::money::{Currency, Money};
use crate::store::{self, Listeners, MemoryRepository, Repository, SubscriptionId};

/// Durable cart record: the ordered line list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CartState {
    pub lines: Vec<CartLine>,
}

impl CartState {
    /// Re-derive every line id and fold lines that share one.
    ///
    /// Records written by older builds, or edited by hand, may carry stale ids;
    /// the "one line per id" invariant must hold before the engine touches them.
    fn normalized(self) -> Self {
        let mut lines: Vec<CartLine> = Vec::with_capacity(self.lines.len());
        for mut line in self.lines {
            line.line_id = key::line_id(&line.product_id, &line.attributes);
            line.quantity = line.quantity.max(1);
            match lines.iter_mut().find(|l| l.line_id == line.line_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => lines.push(line),
            }
        }
        Self { lines }
    }
}

/// The shopper's cart.
///
/// Lines are keyed by `(product, canonical attributes)`; adding an existing
/// configuration merges quantities instead of creating a second line.
/// Operations on unknown line ids are silent no-ops and report `false`.
pub struct Cart {
    state: CartState,
    currency: Currency,
    repo: Box<dyn Repository<CartState>>,
    listeners: Listeners<CartState>,
}

impl Cart {
    /// Create an empty cart mirrored to `repo`, ignoring any stored record.
    pub fn new(currency: Currency, repo: Box<dyn Repository<CartState>>) -> Self {
        Self {
            state: CartState::default(),
            currency,
            repo,
            listeners: Listeners::new(),
        }
    }

    /// Hydrate a cart from `repo`.
    pub fn load(currency: Currency, repo: Box<dyn Repository<CartState>>) -> Self {
        let state = store::load_or_default(repo.as_ref(), "cart")
            .map(CartState::normalized)
            .unwrap_or_default();
        Self {
            state,
            currency,
            repo,
            listeners: Listeners::new(),
        }
    }

    /// Cart backed by a private in-memory repository.
    pub fn in_memory(currency: Currency) -> Self {
        Self::new(currency, Box::new(MemoryRepository::new()))
    }

    /// Add a configuration, merging into an existing line with the same id.
    ///
    /// No upper quantity bound is enforced; stock limits are the catalog's concern.
    pub fn add(&mut self, new: NewLine) -> LineId {
        let line_id = key::line_id(&new.product_id, &new.attributes);
        let quantity = new.quantity.max(1);

        match self.line_mut(&line_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(quantity);
                tracing::debug!(line_id = %line_id, quantity = existing.quantity, "merged into cart line");
            }
            None => {
                self.state.lines.push(CartLine::from_new(new));
                tracing::debug!(line_id = %line_id, quantity, "added cart line");
            }
        }

        self.commit();
        line_id
    }

    /// Remove a line.
    pub fn remove(&mut self, line_id: &LineId) -> bool {
        let len_before = self.state.lines.len();
        self.state.lines.retain(|l| &l.line_id != line_id);
        let removed = self.state.lines.len() < len_before;
        if removed {
            self.commit();
        }
        removed
    }

    /// Increase a line's quantity by one.
    pub fn increase(&mut self, line_id: &LineId) -> bool {
        let Some(line) = self.line_mut(line_id) else {
            return false;
        };
        line.quantity = line.quantity.saturating_add(1);
        self.commit();
        true
    }

    /// Decrease a line's quantity by one, never below 1.
    ///
    /// Lines are only ever removed explicitly.
    pub fn decrease(&mut self, line_id: &LineId) -> bool {
        let Some(line) = self.line_mut(line_id) else {
            return false;
        };
        if line.quantity <= 1 {
            return false;
        }
        line.quantity -= 1;
        self.commit();
        true
    }

    /// Flip a line's selection flag.
    pub fn toggle_selected(&mut self, line_id: &LineId) -> bool {
        let Some(line) = self.line_mut(line_id) else {
            return false;
        };
        line.selected = !line.selected;
        self.commit();
        true
    }

    /// Set every line's selection flag.
    pub fn select_all(&mut self, selected: bool) -> bool {
        let changed = self.state.lines.iter().any(|l| l.selected != selected);
        if !changed {
            return false;
        }
        for line in &mut self.state.lines {
            line.selected = selected;
        }
        self.commit();
        true
    }

    /// Remove every selected line in one pass. Returns the removed lines.
    pub fn remove_selected(&mut self) -> Vec<CartLine> {
        let (removed, kept): (Vec<CartLine>, Vec<CartLine>) = std::mem::take(&mut self.state.lines)
            .into_iter()
            .partition(|l| l.selected);
        self.state.lines = kept;
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "removed selected cart lines");
            self.commit();
        }
        removed
    }

    /// Merge `attributes` into a line's variant and re-key it.
    ///
    /// If the new id belongs to a different line the two are merged (quantities
    /// summed) and the edited line disappears; otherwise the line is re-keyed
    /// in place.
    pub fn update_variant(&mut self, line_id: &LineId, attributes: Attributes) -> bool {
        self.update_line(
            line_id,
            LineUpdate {
                attributes: Some(attributes),
                quantity: None,
            },
        )
    }

    /// Apply an attribute and/or quantity edit to a line.
    ///
    /// Collision handling matches [`Cart::update_variant`]; the colliding line
    /// receives the edited line's resulting quantity.
    pub fn update_line(&mut self, line_id: &LineId, update: LineUpdate) -> bool {
        let Some(index) = self.position(line_id) else {
            return false;
        };
        let Some(line) = self.state.lines.get(index) else {
            return false;
        };

        let mut merged = line.attributes.clone();
        if let Some(attributes) = update.attributes {
            merged.extend(attributes);
        }
        let quantity = update.quantity.map_or(line.quantity, |q| q.max(1));
        let new_id = key::line_id(&line.product_id, &merged);

        let collision = self
            .state
            .lines
            .iter()
            .enumerate()
            .position(|(i, l)| i != index && l.line_id == new_id);

        match collision {
            Some(target) => {
                if let Some(target_line) = self.state.lines.get_mut(target) {
                    target_line.quantity = target_line.quantity.saturating_add(quantity);
                }
                self.state.lines.remove(index);
                tracing::debug!(from = %line_id, into = %new_id, "merged cart line after variant change");
            }
            None => {
                let Some(line) = self.state.lines.get_mut(index) else {
                    return false;
                };
                if line.attributes == merged && line.quantity == quantity {
                    return false;
                }
                line.attributes = merged;
                line.quantity = quantity;
                line.line_id = new_id;
            }
        }

        self.commit();
        true
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        if self.state.lines.is_empty() {
            return;
        }
        self.state.lines.clear();
        self.commit();
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> &CartState {
        &self.state
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.state.lines
    }

    pub fn line(&self, line_id: &LineId) -> Option<&CartLine> {
        self.state.lines.iter().find(|l| &l.line_id == line_id)
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.state.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    pub fn item_count(&self) -> u64 {
        self.state.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn selected_lines(&self) -> impl Iterator<Item = &CartLine> {
        self.state.lines.iter().filter(|l| l.selected)
    }

    pub fn selected_count(&self) -> usize {
        self.selected_lines().count()
    }

    pub fn has_selection(&self) -> bool {
        self.state.lines.iter().any(|l| l.selected)
    }

    /// True when the cart is non-empty and every line is selected.
    pub fn all_selected(&self) -> bool {
        !self.state.lines.is_empty() && self.state.lines.iter().all(|l| l.selected)
    }

    /// Sum of `unit_price * quantity` over selected lines.
    pub fn selected_subtotal(&self) -> Result<Money, StateError> {
        let mut total = Money::zero(self.currency);
        for line in self.selected_lines() {
            let line_total = line.line_total().ok_or(StateError::Overflow)?;
            total = self.checked_add(total, line_total)?;
        }
        Ok(total)
    }

    /// Savings against original prices over selected lines.
    pub fn selected_savings(&self) -> Result<Money, StateError> {
        let mut total = Money::zero(self.currency);
        for savings in self.selected_lines().filter_map(CartLine::savings) {
            total = self.checked_add(total, savings)?;
        }
        Ok(total)
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&CartState) + Send + 'static,
    ) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn checked_add(&self, total: Money, amount: Money) -> Result<Money, StateError> {
        if amount.currency != self.currency {
            return Err(StateError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: amount.currency.code().to_string(),
            });
        }
        total.try_add(&amount).ok_or(StateError::Overflow)
    }

    fn position(&self, line_id: &LineId) -> Option<usize> {
        self.state.lines.iter().position(|l| &l.line_id == line_id)
    }

    fn line_mut(&mut self, line_id: &LineId) -> Option<&mut CartLine> {
        self.state.lines.iter_mut().find(|l| &l.line_id == line_id)
    }

    fn commit(&mut self) {
        store::save_best_effort(self.repo.as_ref(), &self.state, "cart");
        self.listeners.notify(&self.state);
    }
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("state", &self.state)
            .field("currency", &self.currency)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::key::attributes;
    use std::sync::{Arc, Mutex};

    fn tee(size: &str, quantity: u32) -> NewLine {
        NewLine::new("P1", "Tee", Money::from_major(500, Currency::BDT))
            .with_attribute("size", size)
            .with_quantity(quantity)
    }

    #[test]
    fn test_add_merges_same_configuration() {
        let mut cart = Cart::in_memory(Currency::BDT);
        cart.add(tee("M", 1));
        cart.add(tee("M", 2));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_merges_regardless_of_attribute_order() {
        let mut cart = Cart::in_memory(Currency::BDT);
        let price = Money::from_major(10, Currency::BDT);
        cart.add(
            NewLine::new("p", "Shoe", price)
                .with_attributes(attributes([("size", "42"), ("color", "black")])),
        );
        cart.add(
            NewLine::new("p", "Shoe", price)
                .with_attributes(attributes([("color", "black"), ("size", "42")]))
                .with_quantity(4),
        );

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_decrease_floors_at_one() {
        let mut cart = Cart::in_memory(Currency::BDT);
        let id = cart.add(tee("M", 2));

        assert!(cart.decrease(&id));
        assert!(!cart.decrease(&id));
        assert_eq!(cart.line(&id).unwrap().quantity, 1);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::in_memory(Currency::BDT);
        let id = cart.add(tee("M", 1));

        assert!(cart.remove(&id));
        assert!(!cart.remove(&id));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut cart = Cart::in_memory(Currency::BDT);
        let missing = LineId::new("nope::default");

        assert!(!cart.increase(&missing));
        assert!(!cart.decrease(&missing));
        assert!(!cart.toggle_selected(&missing));
        assert!(!cart.update_variant(&missing, attributes([("size", "L")])));
        assert!(!cart.select_all(true));
        assert!(cart.remove_selected().is_empty());
    }

    #[test]
    fn test_update_variant_in_place() {
        let mut cart = Cart::in_memory(Currency::BDT);
        let id = cart.add(tee("M", 2));
        cart.add(NewLine::new("P2", "Cap", Money::from_major(100, Currency::BDT)));

        assert!(cart.update_variant(&id, attributes([("size", "L")])));

        assert_eq!(cart.len(), 2);
        assert!(cart.line(&id).is_none());
        let first = &cart.lines()[0];
        assert_eq!(first.line_id.as_str(), "P1::size:L");
        assert_eq!(first.quantity, 2);
    }

    #[test]
    fn test_update_variant_merges_into_colliding_line() {
        let mut cart = Cart::in_memory(Currency::BDT);
        let medium = cart.add(tee("M", 2));
        let large = cart.add(tee("L", 3));

        assert!(cart.update_variant(&medium, attributes([("size", "L")])));

        assert_eq!(cart.len(), 1);
        assert!(cart.line(&medium).is_none());
        assert_eq!(cart.line(&large).unwrap().quantity, 5);
    }

    #[test]
    fn test_update_variant_adds_new_axis() {
        let mut cart = Cart::in_memory(Currency::BDT);
        let id = cart.add(tee("M", 1));

        cart.update_variant(&id, attributes([("color", "blue")]));

        let line = &cart.lines()[0];
        assert_eq!(line.line_id.as_str(), "P1::color:blue|size:M");
        assert_eq!(line.attributes.len(), 2);
    }

    #[test]
    fn test_update_variant_to_same_attributes_is_noop() {
        let mut cart = Cart::in_memory(Currency::BDT);
        let id = cart.add(tee("M", 1));
        assert!(!cart.update_variant(&id, attributes([("size", "M")])));
    }

    #[test]
    fn test_update_line_replaces_quantity() {
        let mut cart = Cart::in_memory(Currency::BDT);
        let medium = cart.add(tee("M", 2));
        let large = cart.add(tee("L", 1));

        cart.update_line(
            &medium,
            LineUpdate {
                attributes: None,
                quantity: Some(7),
            },
        );
        assert_eq!(cart.line(&medium).unwrap().quantity, 7);

        cart.update_line(
            &medium,
            LineUpdate {
                attributes: Some(attributes([("size", "L")])),
                quantity: Some(4),
            },
        );
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(&large).unwrap().quantity, 5);
    }

    #[test]
    fn test_selection_and_remove_selected() {
        let mut cart = Cart::in_memory(Currency::BDT);
        let medium = cart.add(tee("M", 1));
        let large = cart.add(tee("L", 1));
        assert!(cart.all_selected());

        cart.toggle_selected(&large);
        assert_eq!(cart.selected_count(), 1);

        let removed = cart.remove_selected();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].line_id, medium);
        assert!(cart.line(&large).is_some());
        assert!(!cart.has_selection());
    }

    #[test]
    fn test_selected_subtotal_and_savings() {
        let mut cart = Cart::in_memory(Currency::BDT);
        cart.add(
            NewLine::new("a", "A", Money::from_major(400, Currency::BDT))
                .with_original_price(Money::from_major(500, Currency::BDT))
                .with_quantity(2),
        );
        let b = cart.add(NewLine::new("b", "B", Money::from_major(300, Currency::BDT)));

        assert_eq!(cart.selected_subtotal().unwrap(), Money::from_major(1100, Currency::BDT));
        assert_eq!(cart.selected_savings().unwrap(), Money::from_major(200, Currency::BDT));

        cart.toggle_selected(&b);
        assert_eq!(cart.selected_subtotal().unwrap(), Money::from_major(800, Currency::BDT));
    }

    #[test]
    fn test_selected_subtotal_rejects_foreign_currency() {
        let mut cart = Cart::in_memory(Currency::BDT);
        cart.add(NewLine::new("a", "A", Money::from_major(1, Currency::USD)));
        assert!(matches!(
            cart.selected_subtotal(),
            Err(StateError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_mutations_write_through() {
        let repo = MemoryRepository::new();
        let mut cart = Cart::new(Currency::BDT, Box::new(repo.clone()));

        let id = cart.add(tee("M", 1));
        assert_eq!(repo.stored().unwrap().lines.len(), 1);

        cart.increase(&id);
        assert_eq!(repo.stored().unwrap().lines[0].quantity, 2);

        cart.clear();
        assert!(repo.stored().unwrap().lines.is_empty());
    }

    #[test]
    fn test_load_normalizes_duplicate_ids() {
        let mut line = CartLine::from_new(tee("M", 2));
        line.line_id = LineId::new("legacy-id");
        let twin = CartLine::from_new(tee("M", 3));

        let repo = MemoryRepository::with_record(CartState {
            lines: vec![line, twin],
        });
        let cart = Cart::load(Currency::BDT, Box::new(repo));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].line_id.as_str(), "P1::size:M");
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_listeners_see_effective_mutations_only() {
        let counts = Arc::new(Mutex::new(Vec::new()));
        let mut cart = Cart::in_memory(Currency::BDT);
        let sink = Arc::clone(&counts);
        cart.subscribe(move |state| sink.lock().unwrap().push(state.lines.len()));

        let id = cart.add(tee("M", 1));
        cart.decrease(&id);
        cart.remove(&LineId::new("missing"));
        cart.remove(&id);

        assert_eq!(*counts.lock().unwrap(), vec![1, 0]);
    }

    struct ReadOnlyRepository;

    impl Repository<CartState> for ReadOnlyRepository {
        fn load(&self) -> Result<Option<CartState>, StateError> {
            Ok(None)
        }

        fn save(&self, _record: &CartState) -> Result<(), StateError> {
            Err(StateError::Storage("disk full".to_string()))
        }
    }

    #[test]
    fn test_failed_save_keeps_mutation() {
        let calls = Arc::new(Mutex::new(0));
        let mut cart = Cart::new(Currency::BDT, Box::new(ReadOnlyRepository));
        let sink = Arc::clone(&calls);
        cart.subscribe(move |_| *sink.lock().unwrap() += 1);

        let id = cart.add(tee("M", 2));
        cart.increase(&id);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(&id).unwrap().quantity, 3);
        assert_eq!(*calls.lock().unwrap(), 2);
    }
}
