//! Bridges [`Cache`] to the state engine's persistence contract.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use shopstate_core::{Repository, RepositoryProvider, StateError};

use crate::Cache;

/// One container record stored under a single key.
pub struct KvRepository<S> {
    cache: Cache,
    key: String,
    _record: PhantomData<fn() -> S>,
}

impl<S> KvRepository<S> {
    pub fn new(cache: Cache, key: impl Into<String>) -> Self {
        Self {
            cache,
            key: key.into(),
            _record: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<S> Repository<S> for KvRepository<S>
where
    S: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Option<S>, StateError> {
        Ok(self.cache.get(&self.key)?)
    }

    fn save(&self, record: &S) -> Result<(), StateError> {
        self.cache.set(&self.key, record)?;
        tracing::trace!(key = %self.key, "record saved");
        Ok(())
    }
}

impl RepositoryProvider for Cache {
    fn repository<S>(&self, key: &str) -> Box<dyn Repository<S>>
    where
        S: Serialize + DeserializeOwned + Clone + Send + 'static,
    {
        Box::new(KvRepository::new(self.clone(), key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopstate_core::prelude::*;

    fn bdt(major: i64) -> Money {
        Money::from_major(major, Currency::BDT)
    }

    #[test]
    fn test_storefront_roundtrip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::default();
        {
            let cache = Cache::open(dir.path()).unwrap();
            let mut store = Storefront::open(config.clone(), &cache).unwrap();
            store
                .cart
                .add(NewLine::new("prod_1", "Shirt", bdt(850)).with_attribute("size", "M"));
            store.wishlist.add(WishlistEntry::new("prod_2", "Mouse", bdt(15)));
        }

        assert!(dir.path().join("cart-storage.json").is_file());
        assert!(dir.path().join("wishlist-storage.json").is_file());

        let cache = Cache::open(dir.path()).unwrap();
        let store = Storefront::open(config, &cache).unwrap();
        assert_eq!(store.cart.len(), 1);
        assert!(store
            .cart
            .line(&LineId::new("prod_1::size:M"))
            .is_some());
        assert!(store.wishlist.is_member(&ProductId::new("prod_2")));
    }

    #[test]
    fn test_corrupt_record_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cart-storage.json"), b"{ not json").unwrap();

        let cache = Cache::open(dir.path()).unwrap();
        let store = Storefront::open(EngineConfig::default(), &cache).unwrap();
        assert!(store.cart.is_empty());
    }

    #[test]
    fn test_save_error_maps_to_storage() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::open(dir.path()).unwrap();
        let repo: KvRepository<u32> = KvRepository::new(cache, "bad key");
        assert!(matches!(repo.save(&1), Err(StateError::Storage(_))));
    }
}
