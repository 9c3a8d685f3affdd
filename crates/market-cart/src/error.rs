//! Cart error types.

use std::sync::Arc;

use market_kv::CacheError;
use thiserror::Error;

use crate::ids::ProductId;

/// Errors that can occur in cart operations.
#[derive(Error, Debug, Clone)]
pub enum CartError {
    /// The cart was requested from a scope that never received a store.
    #[error("cart accessed outside of a cart provider scope")]
    MissingProvider,

    /// A store was provided twice to the same scope.
    #[error("a cart store was already provided to this scope")]
    AlreadyProvided,

    /// Item not in cart.
    #[error("Item not in cart: {0}")]
    ItemNotFound(ProductId),

    /// Price is NaN or infinite and cannot be stored as a JSON number.
    #[error("Invalid price for item {0}")]
    InvalidPrice(ProductId),

    /// Quantity would exceed `u32::MAX`.
    #[error("Quantity overflow for item {0}")]
    QuantityOverflow(ProductId),

    /// The persisted snapshot could not be parsed.
    #[error("Corrupt cart snapshot under {key}: {source}")]
    CorruptSnapshot {
        key: String,
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// A write still failed after all retry attempts.
    #[error("Failed to persist cart after {attempts} attempt(s): {source}")]
    Persist {
        attempts: u32,
        #[source]
        source: Arc<CacheError>,
    },

    /// The background writer is gone.
    #[error("Cart write queue is closed")]
    QueueClosed,

    /// Configuration rejected at startup.
    #[error("Invalid cart configuration: {0}")]
    InvalidConfig(String),

    /// Reading from storage failed.
    #[error("Storage error: {0}")]
    Storage(Arc<CacheError>),
}

impl From<CacheError> for CartError {
    fn from(e: CacheError) -> Self {
        CartError::Storage(Arc::new(e))
    }
}
