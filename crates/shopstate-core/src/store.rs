//! Persistence and change-notification contracts shared by every container.
//!
//! Each container owns its state in memory and mirrors a durable record to a
//! [`Repository`] after every effective mutation. The in-memory state is
//! authoritative: a failed save is logged and otherwise ignored.

use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};

use crate::StateError;

/// Durable mirror for one container record.
pub trait Repository<S>: Send {
    /// Load the stored record, if any.
    fn load(&self) -> Result<Option<S>, StateError>;

    /// Replace the stored record.
    fn save(&self, record: &S) -> Result<(), StateError>;
}

/// Builds repositories for named storage keys.
///
/// Swapping storage backends is a matter of handing a different provider to
/// [`Storefront::open`](crate::Storefront::open).
pub trait RepositoryProvider {
    fn repository<S>(&self, key: &str) -> Box<dyn Repository<S>>
    where
        S: Serialize + DeserializeOwned + Clone + Send + 'static;
}

/// In-memory repository.
///
/// Clones share the same slot, so a test can keep a handle and inspect what
/// the container wrote.
#[derive(Debug)]
pub struct MemoryRepository<S> {
    slot: Arc<Mutex<Option<S>>>,
}

impl<S> MemoryRepository<S> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a repository pre-populated with a record.
    pub fn with_record(record: S) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(record))),
        }
    }
}

impl<S: Clone> MemoryRepository<S> {
    /// The last saved record.
    pub fn stored(&self) -> Option<S> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl<S> Clone for MemoryRepository<S> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<S> Default for MemoryRepository<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Send> Repository<S> for MemoryRepository<S> {
    fn load(&self) -> Result<Option<S>, StateError> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| StateError::Storage(e.to_string()))?;
        Ok(slot.clone())
    }

    fn save(&self, record: &S) -> Result<(), StateError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| StateError::Storage(e.to_string()))?;
        *slot = Some(record.clone());
        Ok(())
    }
}

/// Provider handing out a fresh [`MemoryRepository`] per key.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryProvider;

impl RepositoryProvider for MemoryProvider {
    fn repository<S>(&self, _key: &str) -> Box<dyn Repository<S>>
    where
        S: Serialize + DeserializeOwned + Clone + Send + 'static,
    {
        Box::new(MemoryRepository::new())
    }
}

/// Load a record, falling back to `None` when the mirror is unreadable.
pub(crate) fn load_or_default<S>(repo: &dyn Repository<S>, container: &'static str) -> Option<S> {
    match repo.load() {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(container, error = %e, "failed to load persisted state, starting empty");
            None
        }
    }
}

/// Write a record through to its mirror, absorbing failures.
pub(crate) fn save_best_effort<S>(repo: &dyn Repository<S>, record: &S, container: &'static str) {
    if let Err(e) = repo.save(record) {
        tracing::warn!(container, error = %e, "failed to persist state");
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<S> = Box<dyn FnMut(&S) + Send>;

/// Listener list notified with the new snapshot after each effective mutation.
pub struct Listeners<S> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener<S>)>,
}

impl<S> Listeners<S> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&S) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let len_before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() < len_before
    }

    pub fn notify(&mut self, snapshot: &S) {
        for (_, listener) in &mut self.entries {
            listener(snapshot);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S> Default for Listeners<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for Listeners<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
