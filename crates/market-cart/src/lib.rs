//! Persistent shopping cart store for the marketplace app.
//!
//! This crate holds the cart that the app's screens read and mutate:
//!
//! - **Cart**: ordered line items with merge-on-add and decrement-to-removal
//! - **CartStore**: the single owner of the cart, persisting every change
//!   through an ordered write queue
//! - **CartContext**: the provider scope consumers obtain the store from
//!
//! # Example
//!
//! ```rust,ignore
//! use market_cart::prelude::*;
//! use market_kv::MemoryStore;
//!
//! let store = CartStore::load(MemoryStore::new(), CartConfig::default()).await?;
//! let context = CartContext::with_store(store);
//!
//! let cart = context.cart()?;
//! cart.add_to_cart(NewLineItem::new("p1", "Shirt", "https://img/p1.png", 10.0)).await?;
//! cart.increment(&ProductId::new("p1")).await?;
//!
//! assert_eq!(cart.item_count(), 2);
//! ```

pub mod cart;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
mod persist;
pub mod store;

pub use cart::{Cart, LineItem, NewLineItem};
pub use config::{BackoffStrategy, CartConfig, CorruptSnapshotPolicy, RetryPolicy};
pub use context::CartContext;
pub use error::CartError;
pub use ids::ProductId;
pub use store::{CartHandle, CartStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cart::{Cart, LineItem, NewLineItem};
    pub use crate::config::{BackoffStrategy, CartConfig, CorruptSnapshotPolicy, RetryPolicy};
    pub use crate::context::CartContext;
    pub use crate::error::CartError;
    pub use crate::ids::ProductId;
    pub use crate::store::{CartHandle, CartStore};
}
