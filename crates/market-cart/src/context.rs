//! Provider scope handing the cart store to consumers.
//!
//! A screen or command receives a `&CartContext` and asks it for the cart.
//! Asking before a store was provided is a configuration error, not an empty
//! cart.

use std::sync::{Arc, OnceLock};

use crate::error::CartError;
use crate::store::CartStore;

/// Scope owning the one [`CartStore`] shared by its consumers.
#[derive(Debug, Default)]
pub struct CartContext {
    store: OnceLock<Arc<CartStore>>,
}

impl CartContext {
    /// Create a scope with no store yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope that already provides `store`.
    pub fn with_store(store: CartStore) -> Self {
        let context = Self::new();
        let _ = context.store.set(Arc::new(store));
        context
    }

    /// Install the store for this scope. Allowed once.
    pub fn provide(&self, store: CartStore) -> Result<Arc<CartStore>, CartError> {
        let store = Arc::new(store);
        self.store
            .set(store.clone())
            .map_err(|_| CartError::AlreadyProvided)?;
        Ok(store)
    }

    /// The provided store.
    pub fn cart(&self) -> Result<Arc<CartStore>, CartError> {
        self.store.get().cloned().ok_or(CartError::MissingProvider)
    }

    /// Whether a store has been provided.
    pub fn is_provided(&self) -> bool {
        self.store.get().is_some()
    }
}
