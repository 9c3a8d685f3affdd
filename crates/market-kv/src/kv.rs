//! Key-value store contract and the typed JSON wrapper.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::CacheError;

/// Raw key-value persistence service.
///
/// `set` replaces whatever is stored under the key. Implementations must be
/// shareable across tasks because the cart's writer runs in its own task.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }

    /// List all keys currently stored.
    async fn keys(&self) -> Result<Vec<String>, CacheError>;
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        (**self).delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        (**self).exists(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        (**self).keys().await
    }
}

/// Type-safe cache over any [`KeyValueStore`].
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`.
pub struct Cache<S> {
    store: S,
}

impl<S: KeyValueStore> Cache<S> {
    /// Wrap a raw store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist. Bytes that do not parse as
    /// `T` are a [`CacheError::Serialize`].
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cart: Option<Vec<LineItem>> = cache.get("@GoMarketplace:cart").await?;
    /// ```
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key).await? {
            Some(bytes) => {
                let value: T = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a value in the cache.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// cache.set("@GoMarketplace:cart", &items).await?;
    /// ```
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, &bytes).await
    }

    /// Delete a value from the cache.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await
    }

    /// Check if a key exists in the cache.
    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.store.exists(key).await
    }

    /// Get all keys in the cache.
    pub async fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.store.keys().await
    }

    /// Access the underlying raw store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: Clone> Clone for Cache<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust,ignore
/// let key = cache_key!("@GoMarketplace", "cart");
/// // Returns "@GoMarketplace:cart"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: String,
        quantity: u32,
    }

    #[test]
    fn test_cache_key_macro() {
        assert_eq!(cache_key!("@GoMarketplace", "cart"), "@GoMarketplace:cart");
        assert_eq!(cache_key!("a", "b", 3), "a:b:3");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let cache = Cache::new(MemoryStore::new());
        let value: Option<Vec<Entry>> = cache.get("missing").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = Cache::new(MemoryStore::new());
        let entries = vec![Entry {
            id: "p1".into(),
            quantity: 2,
        }];

        cache.set("k", &entries).await.unwrap();
        let loaded: Vec<Entry> = cache.get("k").await.unwrap().unwrap();
        assert_eq!(loaded, entries);
        assert!(cache.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_value_is_serialize_error() {
        let cache = Cache::new(MemoryStore::new());
        cache.store().set("k", b"not json").await.unwrap();

        let result: Result<Option<Vec<Entry>>, _> = cache.get("k").await;
        assert!(matches!(result, Err(CacheError::Serialize(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = Cache::new(MemoryStore::new());
        cache.set("k", &1u32).await.unwrap();
        cache.delete("k").await.unwrap();
        assert!(!cache.exists("k").await.unwrap());
        assert!(cache.keys().await.unwrap().is_empty());
    }
}
