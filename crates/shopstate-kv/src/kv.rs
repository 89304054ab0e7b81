//! Key-value store wrapper with automatic serialization.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::backend::{FileBackend, KvBackend, MemoryBackend};
use crate::KvError;

/// Type-safe store over a [`KvBackend`].
///
/// Values are stored as JSON. Clones share the backend, and a namespaced
/// cache prefixes every key with `<namespace>:`.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn KvBackend>,
    namespace: Option<String>,
}

impl Cache {
    /// Open a process-local store.
    ///
    /// # Example
    ///
    /// ```rust
    /// let cache = shopstate_kv::Cache::open_default();
    /// cache.set("greeting", &"hello").unwrap();
    /// ```
    pub fn open_default() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    /// Open a file-backed store rooted at `dir`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cache = Cache::open(".shopstate")?;
    /// ```
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, KvError> {
        Ok(Self::with_backend(Arc::new(FileBackend::open(dir)?)))
    }

    pub fn with_backend(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            namespace: None,
        }
    }

    /// A view of the same backend with every key under `namespace`.
    pub fn namespaced(&self, namespace: &str) -> Self {
        let namespace = match &self.namespace {
            Some(outer) => crate::cache_key!(outer, namespace),
            None => namespace.to_string(),
        };
        Self {
            backend: Arc::clone(&self.backend),
            namespace: Some(namespace),
        }
    }

    fn full_key(&self, key: &str) -> String {
        match &self.namespace {
            Some(ns) => crate::cache_key!(ns, key),
            None => key.to_string(),
        }
    }

    /// Get a value from the store.
    ///
    /// Returns `None` if the key doesn't exist.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, KvError> {
        match self.backend.get(&self.full_key(key))? {
            Some(bytes) => {
                let value: T = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a value in the store.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), KvError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.backend.set(&self.full_key(key), &bytes)
    }

    pub fn delete(&self, key: &str) -> Result<(), KvError> {
        self.backend.delete(&self.full_key(key))
    }

    pub fn exists(&self, key: &str) -> Result<bool, KvError> {
        self.backend.exists(&self.full_key(key))
    }

    /// Keys visible through this cache, without the namespace prefix.
    pub fn keys(&self) -> Result<Vec<String>, KvError> {
        let keys = self.backend.keys()?;
        Ok(match &self.namespace {
            Some(ns) => {
                let prefix = format!("{}:", ns);
                keys.into_iter()
                    .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
                    .collect()
            }
            None => keys,
        })
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust
/// let key = shopstate_kv::cache_key!("shop", "cart-storage");
/// assert_eq!(key, "shop:cart-storage");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}
