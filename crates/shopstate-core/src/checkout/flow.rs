//! Checkout wizard state machine.
//!
//! ```text
//! Review --[selected lines]--> Shipping --[address]--> Payment --[payment method]--> Complete
//! ```
//!
//! Forward moves are guarded, backward moves are not, and `Complete` is
//! terminal until the wizard is re-entered.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::Cart;
use crate::checkout::payment::{self, CASH_ON_DELIVERY};
use crate::checkout::{AddressPatch, NewAddress, SavedAddress, ShippingMethod};
use crate::config::{EngineConfig, ShippingRates};
use crate::error::StateError;
use crate::ids::{AddressId, PaymentMethodId};
use crate::money::{Currency, Money};
use crate::store::{self, Listeners, MemoryRepository, Repository, SubscriptionId};

/// Steps in the checkout flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    /// Cart review and selection.
    #[default]
    Review,
    /// Address and shipping tier.
    Shipping,
    /// Payment method.
    Payment,
    /// Order placed.
    Complete,
}

impl CheckoutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Review => "review",
            CheckoutStep::Shipping => "shipping",
            CheckoutStep::Payment => "payment",
            CheckoutStep::Complete => "complete",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CheckoutStep::Review => "Review Cart",
            CheckoutStep::Shipping => "Shipping",
            CheckoutStep::Payment => "Payment",
            CheckoutStep::Complete => "Complete",
        }
    }

    /// Get the step number (1-indexed).
    pub fn number(&self) -> u8 {
        match self {
            CheckoutStep::Review => 1,
            CheckoutStep::Shipping => 2,
            CheckoutStep::Payment => 3,
            CheckoutStep::Complete => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(CheckoutStep::Review),
            2 => Some(CheckoutStep::Shipping),
            3 => Some(CheckoutStep::Payment),
            4 => Some(CheckoutStep::Complete),
            _ => None,
        }
    }

    pub fn progress_percent(&self) -> u8 {
        self.number() * 25
    }

    fn previous(&self) -> Option<Self> {
        match self {
            CheckoutStep::Shipping => Some(CheckoutStep::Review),
            CheckoutStep::Payment => Some(CheckoutStep::Shipping),
            CheckoutStep::Review | CheckoutStep::Complete => None,
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Why a forward transition was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockedReason {
    #[error("Please select items to checkout.")]
    EmptySelection,

    #[error("Please select or add a shipping address.")]
    NoAddressSelected,

    #[error("Please select a payment method.")]
    NoPaymentMethodSelected,
}

/// Outcome of a step transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The wizard moved to this step.
    Moved(CheckoutStep),
    /// A guard refused the move; the step is unchanged.
    Blocked(BlockedReason),
    /// No transition exists from the current step.
    Unchanged(CheckoutStep),
}

impl Transition {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Transition::Blocked(_))
    }

    pub fn blocked_reason(&self) -> Option<BlockedReason> {
        match self {
            Transition::Blocked(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// What the wizard needs from the cart it checks out.
pub trait CheckoutCart {
    /// At least one line participates in the order.
    fn has_selection(&self) -> bool;

    /// Drop every line once the order has been placed.
    fn clear_after_order(&mut self);
}

impl CheckoutCart for Cart {
    fn has_selection(&self) -> bool {
        Cart::has_selection(self)
    }

    fn clear_after_order(&mut self) {
        self.clear();
    }
}

/// Full wizard state, as seen by listeners.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckoutState {
    pub active_step: CheckoutStep,
    pub saved_addresses: Vec<SavedAddress>,
    pub selected_address_id: Option<AddressId>,
    pub shipping_method: ShippingMethod,
    pub selected_payment_method: Option<PaymentMethodId>,
}

/// Durable subset of the wizard state: the address book only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckoutRecord {
    pub saved_addresses: Vec<SavedAddress>,
    pub selected_address_id: Option<AddressId>,
}

impl From<&CheckoutState> for CheckoutRecord {
    fn from(state: &CheckoutState) -> Self {
        Self {
            saved_addresses: state.saved_addresses.clone(),
            selected_address_id: state.selected_address_id.clone(),
        }
    }
}

/// Totals shown beside the wizard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSummary {
    /// Number of selected lines.
    pub selected_lines: usize,
    /// Sum of quantities over selected lines.
    pub item_count: u64,
    pub subtotal: Money,
    pub savings: Money,
    /// Zero when nothing is selected.
    pub shipping: Money,
    pub total: Money,
}

/// The multi-step checkout wizard.
pub struct CheckoutWizard {
    state: CheckoutState,
    currency: Currency,
    rates: ShippingRates,
    repo: Box<dyn Repository<CheckoutRecord>>,
    listeners: Listeners<CheckoutState>,
}

impl CheckoutWizard {
    /// Create a wizard with a fresh address book seeded from `config`.
    pub fn new(config: &EngineConfig, repo: Box<dyn Repository<CheckoutRecord>>) -> Self {
        let saved_addresses = config
            .seed_addresses
            .iter()
            .cloned()
            .map(|new| SavedAddress::from_new(AddressId::generate(), new))
            .collect();
        Self::with_state(
            config,
            repo,
            CheckoutState {
                saved_addresses,
                ..CheckoutState::default()
            },
        )
    }

    /// Hydrate the address book from `repo`; session fields start fresh.
    pub fn load(config: &EngineConfig, repo: Box<dyn Repository<CheckoutRecord>>) -> Self {
        match store::load_or_default(repo.as_ref(), "checkout") {
            Some(record) => {
                let mut state = CheckoutState {
                    saved_addresses: record.saved_addresses,
                    selected_address_id: record.selected_address_id,
                    ..CheckoutState::default()
                };
                // A selection must always resolve to an address in the book.
                if let Some(id) = &state.selected_address_id {
                    if !state.saved_addresses.iter().any(|a| &a.id == id) {
                        tracing::warn!(address_id = %id, "dropping dangling address selection");
                        state.selected_address_id = None;
                    }
                }
                Self::with_state(config, repo, state)
            }
            None => Self::new(config, repo),
        }
    }

    pub fn in_memory(config: &EngineConfig) -> Self {
        Self::new(config, Box::new(MemoryRepository::new()))
    }

    fn with_state(
        config: &EngineConfig,
        repo: Box<dyn Repository<CheckoutRecord>>,
        state: CheckoutState,
    ) -> Self {
        Self {
            state,
            currency: config.currency,
            rates: config.shipping,
            repo,
            listeners: Listeners::new(),
        }
    }

    /// Re-enter the wizard: back to `Review` with default shipping and no
    /// payment method. The address book and its selection are kept.
    pub fn enter(&mut self) {
        let fresh = self.state.active_step == CheckoutStep::Review
            && self.state.shipping_method == ShippingMethod::default()
            && self.state.selected_payment_method.is_none();
        if fresh {
            return;
        }
        self.state.active_step = CheckoutStep::Review;
        self.state.shipping_method = ShippingMethod::default();
        self.state.selected_payment_method = None;
        self.commit();
    }

    /// Guard for leaving the current step. `Complete` has no forward move
    /// and always passes.
    pub fn can_advance(&self, cart: &impl CheckoutCart) -> Result<(), BlockedReason> {
        match self.state.active_step {
            CheckoutStep::Review if !cart.has_selection() => Err(BlockedReason::EmptySelection),
            CheckoutStep::Shipping if self.selected_address().is_none() => {
                Err(BlockedReason::NoAddressSelected)
            }
            CheckoutStep::Payment if self.state.selected_payment_method.is_none() => {
                Err(BlockedReason::NoPaymentMethodSelected)
            }
            _ => Ok(()),
        }
    }

    /// Move forward one step. From `Payment` this places the order via
    /// [`CheckoutWizard::finalize`].
    pub fn advance(&mut self, cart: &mut impl CheckoutCart) -> Transition {
        if let Err(reason) = self.can_advance(&*cart) {
            tracing::debug!(step = %self.state.active_step.as_str(), ?reason, "checkout transition blocked");
            return Transition::Blocked(reason);
        }

        let next = match self.state.active_step {
            CheckoutStep::Review => CheckoutStep::Shipping,
            CheckoutStep::Shipping => CheckoutStep::Payment,
            CheckoutStep::Payment => return self.finalize(cart),
            CheckoutStep::Complete => return Transition::Unchanged(CheckoutStep::Complete),
        };

        self.state.active_step = next;
        self.commit();
        Transition::Moved(next)
    }

    /// Move back one step. No-op at `Review` and at the terminal `Complete`.
    pub fn back(&mut self) -> Transition {
        match self.state.active_step.previous() {
            Some(prev) => {
                self.state.active_step = prev;
                self.commit();
                Transition::Moved(prev)
            }
            None => Transition::Unchanged(self.state.active_step),
        }
    }

    /// Place the order: clear the cart, then move to `Complete`.
    ///
    /// Only valid from `Payment`. Backend submission belongs to the caller; if
    /// it fails the caller steps the wizard back explicitly.
    pub fn finalize(&mut self, cart: &mut impl CheckoutCart) -> Transition {
        if self.state.active_step != CheckoutStep::Payment {
            return Transition::Unchanged(self.state.active_step);
        }
        if self.state.selected_payment_method.is_none() {
            return Transition::Blocked(BlockedReason::NoPaymentMethodSelected);
        }

        cart.clear_after_order();
        self.state.active_step = CheckoutStep::Complete;
        tracing::debug!(
            payment = ?self.state.selected_payment_method,
            shipping = %self.state.shipping_method,
            "checkout complete"
        );
        self.commit();
        Transition::Moved(CheckoutStep::Complete)
    }

    /// Append an address and select it.
    pub fn add_address(&mut self, address: NewAddress) -> AddressId {
        let id = AddressId::generate();
        self.state
            .saved_addresses
            .push(SavedAddress::from_new(id.clone(), address));
        self.state.selected_address_id = Some(id.clone());
        self.commit();
        id
    }

    /// Edit an address in place; its id never changes.
    pub fn edit_address(&mut self, id: &AddressId, patch: AddressPatch) -> bool {
        let Some(address) = self.state.saved_addresses.iter_mut().find(|a| &a.id == id) else {
            return false;
        };
        address.apply(patch);
        self.commit();
        true
    }

    /// Delete an address, clearing the selection if it pointed there.
    pub fn delete_address(&mut self, id: &AddressId) -> bool {
        let len_before = self.state.saved_addresses.len();
        self.state.saved_addresses.retain(|a| &a.id != id);
        if self.state.saved_addresses.len() == len_before {
            return false;
        }
        if self.state.selected_address_id.as_ref() == Some(id) {
            self.state.selected_address_id = None;
        }
        self.commit();
        true
    }

    /// Select an existing address.
    pub fn select_address(&mut self, id: &AddressId) -> Result<(), StateError> {
        if !self.state.saved_addresses.iter().any(|a| &a.id == id) {
            return Err(StateError::AddressNotFound(id.to_string()));
        }
        if self.state.selected_address_id.as_ref() != Some(id) {
            self.state.selected_address_id = Some(id.clone());
            self.commit();
        }
        Ok(())
    }

    pub fn set_shipping_method(&mut self, method: ShippingMethod) -> bool {
        if self.state.shipping_method == method {
            return false;
        }
        self.state.shipping_method = method;
        self.commit();
        true
    }

    pub fn set_payment_method(&mut self, method: impl Into<PaymentMethodId>) -> bool {
        let method = method.into();
        if self.state.selected_payment_method.as_ref() == Some(&method) {
            return false;
        }
        if payment::payment_option(&method).is_none() {
            tracing::debug!(method = %method, "payment method not in the storefront catalog");
        }
        self.state.selected_payment_method = Some(method);
        self.commit();
        true
    }

    /// Cost of the chosen shipping tier, queryable at any step.
    pub fn shipping_cost(&self) -> Money {
        self.state.shipping_method.cost(&self.rates, self.currency)
    }

    /// Totals for the selected cart lines under the chosen shipping tier.
    pub fn order_summary(&self, cart: &Cart) -> Result<OrderSummary, StateError> {
        let selected_lines = cart.selected_count();
        let item_count = cart
            .selected_lines()
            .map(|l| u64::from(l.quantity))
            .sum();
        let subtotal = cart.selected_subtotal()?;
        let savings = cart.selected_savings()?;
        let shipping = if selected_lines > 0 {
            self.shipping_cost()
        } else {
            Money::zero(self.currency)
        };
        let total = subtotal.try_add(&shipping).ok_or(StateError::Overflow)?;

        Ok(OrderSummary {
            selected_lines,
            item_count,
            subtotal,
            savings,
            shipping,
            total,
        })
    }

    pub fn active_step(&self) -> CheckoutStep {
        self.state.active_step
    }

    pub fn is_complete(&self) -> bool {
        self.state.active_step == CheckoutStep::Complete
    }

    pub fn addresses(&self) -> &[SavedAddress] {
        &self.state.saved_addresses
    }

    pub fn address(&self, id: &AddressId) -> Option<&SavedAddress> {
        self.state.saved_addresses.iter().find(|a| &a.id == id)
    }

    pub fn selected_address_id(&self) -> Option<&AddressId> {
        self.state.selected_address_id.as_ref()
    }

    /// The selected address, resolved against the book.
    pub fn selected_address(&self) -> Option<&SavedAddress> {
        self.state
            .selected_address_id
            .as_ref()
            .and_then(|id| self.address(id))
    }

    pub fn shipping_method(&self) -> ShippingMethod {
        self.state.shipping_method
    }

    pub fn payment_method(&self) -> Option<&PaymentMethodId> {
        self.state.selected_payment_method.as_ref()
    }

    pub fn is_cash_on_delivery(&self) -> bool {
        self.payment_method()
            .is_some_and(|m| m.as_str() == CASH_ON_DELIVERY)
    }

    pub fn snapshot(&self) -> &CheckoutState {
        &self.state
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&CheckoutState) + Send + 'static,
    ) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn commit(&mut self) {
        store::save_best_effort(
            self.repo.as_ref(),
            &CheckoutRecord::from(&self.state),
            "checkout",
        );
        self.listeners.notify(&self.state);
    }
}

impl std::fmt::Debug for CheckoutWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutWizard")
            .field("state", &self.state)
            .field("currency", &self.currency)
            .field("rates", &self.rates)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal cart double.
    #[derive(Default)]
    struct FakeCart {
        selected: bool,
        cleared: bool,
    }

    impl CheckoutCart for FakeCart {
        fn has_selection(&self) -> bool {
            self.selected
        }

        fn clear_after_order(&mut self) {
            self.cleared = true;
            self.selected = false;
        }
    }

    fn address(label: &str) -> NewAddress {
        NewAddress {
            label: label.to_string(),
            phone: "01887654321".to_string(),
            region: "Chattogram".to_string(),
            district: "Chattogram".to_string(),
            area: "Kotwali".to_string(),
            full_address: "Agrabad C/A".to_string(),
            location: None,
        }
    }

    fn wizard() -> CheckoutWizard {
        CheckoutWizard::in_memory(&EngineConfig::default())
    }

    #[test]
    fn test_empty_selection_blocks_review() {
        let mut flow = wizard();
        let mut cart = FakeCart::default();

        assert_eq!(
            flow.advance(&mut cart),
            Transition::Blocked(BlockedReason::EmptySelection)
        );
        assert_eq!(flow.active_step(), CheckoutStep::Review);
    }

    #[test]
    fn test_full_flow() {
        let mut flow = wizard();
        let mut cart = FakeCart {
            selected: true,
            cleared: false,
        };

        assert_eq!(flow.advance(&mut cart), Transition::Moved(CheckoutStep::Shipping));
        assert_eq!(
            flow.advance(&mut cart),
            Transition::Blocked(BlockedReason::NoAddressSelected)
        );

        flow.add_address(address("Office"));
        assert_eq!(flow.advance(&mut cart), Transition::Moved(CheckoutStep::Payment));
        assert_eq!(
            flow.advance(&mut cart),
            Transition::Blocked(BlockedReason::NoPaymentMethodSelected)
        );
        assert!(!cart.cleared);

        flow.set_payment_method("cod");
        assert_eq!(flow.advance(&mut cart), Transition::Moved(CheckoutStep::Complete));
        assert!(cart.cleared);
        assert!(flow.is_cash_on_delivery());
    }

    #[test]
    fn test_complete_is_terminal() {
        let mut flow = wizard();
        let mut cart = FakeCart {
            selected: true,
            cleared: false,
        };
        flow.advance(&mut cart);
        flow.add_address(address("Home"));
        flow.advance(&mut cart);
        flow.set_payment_method("card");
        flow.finalize(&mut cart);

        assert_eq!(flow.back(), Transition::Unchanged(CheckoutStep::Complete));
        assert_eq!(flow.advance(&mut cart), Transition::Unchanged(CheckoutStep::Complete));

        flow.enter();
        assert_eq!(flow.active_step(), CheckoutStep::Review);
        assert!(flow.payment_method().is_none());
        assert_eq!(flow.shipping_method(), ShippingMethod::Regular);
        assert!(flow.selected_address().is_some());
    }

    #[test]
    fn test_back_is_unguarded() {
        let mut flow = wizard();
        let mut cart = FakeCart {
            selected: true,
            cleared: false,
        };
        flow.advance(&mut cart);
        cart.selected = false;
        assert!(flow.can_advance(&cart).is_err());

        assert_eq!(flow.back(), Transition::Moved(CheckoutStep::Review));
        assert_eq!(flow.back(), Transition::Unchanged(CheckoutStep::Review));
    }

    #[test]
    fn test_finalize_outside_payment_is_unchanged() {
        let mut flow = wizard();
        let mut cart = FakeCart {
            selected: true,
            cleared: false,
        };
        flow.set_payment_method("cod");
        assert_eq!(flow.finalize(&mut cart), Transition::Unchanged(CheckoutStep::Review));
        assert!(!cart.cleared);
    }

    #[test]
    fn test_delete_selected_address_clears_selection() {
        let mut flow = wizard();
        let home = flow.add_address(address("Home"));
        let office = flow.add_address(address("Office"));
        assert_eq!(flow.selected_address_id(), Some(&office));

        assert!(flow.delete_address(&home));
        assert_eq!(flow.selected_address_id(), Some(&office));

        assert!(flow.delete_address(&office));
        assert_eq!(flow.selected_address_id(), None);
        assert!(!flow.delete_address(&office));
    }

    #[test]
    fn test_select_unknown_address_is_an_error() {
        let mut flow = wizard();
        assert!(matches!(
            flow.select_address(&AddressId::new("addr_missing")),
            Err(StateError::AddressNotFound(_))
        ));
    }

    #[test]
    fn test_edit_address_keeps_id() {
        let mut flow = wizard();
        let id = flow.add_address(address("Home"));
        assert!(flow.edit_address(
            &id,
            AddressPatch {
                phone: Some("01700000000".to_string()),
                ..AddressPatch::default()
            }
        ));

        let stored = flow.address(&id).unwrap();
        assert_eq!(stored.phone, "01700000000");
        assert_eq!(stored.label, "Home");
        assert!(!flow.edit_address(&AddressId::new("nope"), AddressPatch::default()));
    }

    #[test]
    fn test_shipping_cost_is_pure() {
        let mut flow = wizard();
        assert_eq!(flow.shipping_cost(), Money::from_major(50, Currency::BDT));
        flow.set_shipping_method(ShippingMethod::Express);
        assert_eq!(flow.shipping_cost(), Money::from_major(120, Currency::BDT));
        assert_eq!(flow.active_step(), CheckoutStep::Review);
    }

    #[test]
    fn test_only_address_book_is_persisted() {
        let repo = MemoryRepository::new();
        let mut flow = CheckoutWizard::new(&EngineConfig::default(), Box::new(repo.clone()));
        let id = flow.add_address(address("Home"));
        flow.set_shipping_method(ShippingMethod::Express);
        flow.set_payment_method("nagad");

        let record = repo.stored().unwrap();
        assert_eq!(record.saved_addresses.len(), 1);
        assert_eq!(record.selected_address_id, Some(id.clone()));

        let reloaded = CheckoutWizard::load(&EngineConfig::default(), Box::new(repo));
        assert_eq!(reloaded.selected_address_id(), Some(&id));
        assert_eq!(reloaded.shipping_method(), ShippingMethod::Regular);
        assert!(reloaded.payment_method().is_none());
        assert_eq!(reloaded.active_step(), CheckoutStep::Review);
    }

    #[test]
    fn test_load_drops_dangling_selection() {
        let repo = MemoryRepository::with_record(CheckoutRecord {
            saved_addresses: Vec::new(),
            selected_address_id: Some(AddressId::new("addr_gone")),
        });
        let flow = CheckoutWizard::load(&EngineConfig::default(), Box::new(repo));
        assert!(flow.selected_address_id().is_none());
    }

    #[test]
    fn test_seed_addresses_only_for_fresh_books() {
        let config = EngineConfig {
            seed_addresses: vec![address("Home"), address("Office")],
            ..EngineConfig::default()
        };
        let flow = CheckoutWizard::load(&config, Box::new(MemoryRepository::new()));
        assert_eq!(flow.addresses().len(), 2);
        assert!(flow.selected_address_id().is_none());

        let repo = MemoryRepository::with_record(CheckoutRecord::default());
        let flow = CheckoutWizard::load(&config, Box::new(repo));
        assert!(flow.addresses().is_empty());
    }

    #[test]
    fn test_order_summary_reports_overflow() {
        let flow = wizard();
        let mut cart = Cart::in_memory(Currency::BDT);
        cart.add(crate::cart::NewLine::new(
            "p1",
            "Gold bar",
            Money::new(i64::MAX, Currency::BDT),
        ));

        assert!(matches!(flow.order_summary(&cart), Err(StateError::Overflow)));
    }
}
