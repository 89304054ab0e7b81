//! Type-safe key-value storage for shopstate records.
//!
//! Provides a small, ergonomic API over a byte store with automatic JSON
//! serialization, plus a [`RepositoryProvider`](shopstate_core::RepositoryProvider)
//! implementation so a [`Cache`] can back a whole storefront.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopstate_core::{EngineConfig, Storefront};
//! use shopstate_kv::Cache;
//!
//! let cache = Cache::open(".shopstate")?;
//! let store = Storefront::open(EngineConfig::default(), &cache)?;
//!
//! // Each container writes its record to `<data-dir>/<storage-key>.json`.
//! println!("{} lines in cart", store.cart.len());
//! ```

mod backend;
mod error;
mod kv;
mod repository;

pub use backend::{FileBackend, KvBackend, MemoryBackend};
pub use error::KvError;
pub use kv::Cache;
pub use repository::KvRepository;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, KvError, KvRepository};
}
