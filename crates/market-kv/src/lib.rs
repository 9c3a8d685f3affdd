//! Async key-value persistence for the marketplace cart.
//!
//! The cart treats storage as an opaque key-value service: a value is read by
//! key and a value is written (replacing whatever was there) by key. This
//! crate provides that contract plus two backends and a typed wrapper with
//! automatic JSON serialization.
//!
//! # Example
//!
//! ```rust,ignore
//! use market_kv::{cache_key, Cache, MemoryStore};
//!
//! let cache = Cache::new(MemoryStore::new());
//! let key = cache_key!("@GoMarketplace", "cart");
//!
//! cache.set(&key, &vec!["p1", "p2"]).await?;
//! let items: Option<Vec<String>> = cache.get(&key).await?;
//! ```

mod error;
mod file;
mod kv;
mod memory;

pub use error::CacheError;
pub use file::FileStore;
pub use kv::{Cache, KeyValueStore};
pub use memory::MemoryStore;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, FileStore, KeyValueStore, MemoryStore};
}
