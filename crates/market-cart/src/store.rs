//! The cart store: sole owner and writer of the cart.
//!
//! Mutations update the in-memory cart synchronously, then enqueue a full
//! snapshot on the write queue and wait for that write to land. Readers see
//! the new state as soon as the mutation returns from its critical section,
//! even while the write is still in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use market_kv::{Cache, CacheError, KeyValueStore};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::cart::{Cart, LineItem, NewLineItem};
use crate::config::{CartConfig, CorruptSnapshotPolicy};
use crate::error::CartError;
use crate::ids::ProductId;
use crate::persist::{PendingWrite, WriteQueue};

/// What consumers of the cart can see and do.
#[async_trait]
pub trait CartHandle: Send + Sync {
    /// Current items in display order.
    fn products(&self) -> Vec<LineItem>;

    /// Add a product, merging with an existing line of the same ID.
    async fn add_to_cart(&self, item: NewLineItem) -> Result<(), CartError>;

    /// Increase a line's quantity by 1.
    async fn increment(&self, id: &ProductId) -> Result<(), CartError>;

    /// Decrease a line's quantity by 1, removing it at 0.
    async fn decrement(&self, id: &ProductId) -> Result<(), CartError>;
}

/// Cart state plus its persistence.
pub struct CartStore {
    cart: Mutex<Cart>,
    /// Held by every mutation and for the whole of a reload, so a reload
    /// never installs a snapshot older than a mutation that already returned.
    gate: AsyncMutex<()>,
    cache: Cache<Arc<dyn KeyValueStore>>,
    key: String,
    on_corrupt: CorruptSnapshotPolicy,
    writer: WriteQueue,
    dirty: Arc<AtomicBool>,
}

impl CartStore {
    /// Build a store and populate it from the persisted snapshot.
    ///
    /// A missing snapshot yields an empty cart. A snapshot that does not
    /// parse is `CartError::CorruptSnapshot` unless the config says to reset.
    ///
    /// Must be called inside a tokio runtime: the write queue runs as a task.
    pub async fn load<S: KeyValueStore>(store: S, config: CartConfig) -> Result<Self, CartError> {
        config.validate()?;

        let store: Arc<dyn KeyValueStore> = Arc::new(store);
        let cache = Cache::new(store);
        let key = config.storage_key();
        let cart = read_snapshot(&cache, &key, config.on_corrupt).await?;

        info!(key = %key, items = cart.len(), "loaded cart");

        let dirty = Arc::new(AtomicBool::new(false));
        let writer = WriteQueue::spawn(cache.clone(), key.clone(), config.retry, dirty.clone());

        Ok(Self {
            cart: Mutex::new(cart),
            gate: AsyncMutex::new(()),
            cache,
            key,
            on_corrupt: config.on_corrupt,
            writer,
            dirty,
        })
    }

    /// Re-read the persisted snapshot, replacing the in-memory cart.
    ///
    /// Pending writes are flushed first so the read sees them. Mutations
    /// issued while the reload runs wait for it and apply on top of the
    /// reloaded cart.
    pub async fn reload(&self) -> Result<(), CartError> {
        let _gate = self.gate.lock().await;

        // A failed flush leaves storage behind memory; reading it back would
        // lose the unsaved changes.
        self.writer.flush().await?;

        let cart = read_snapshot(&self.cache, &self.key, self.on_corrupt).await?;
        debug!(key = %self.key, items = cart.len(), "reloaded cart");
        *self.cart.lock() = cart;
        Ok(())
    }

    /// Add a product, merging with an existing line of the same ID.
    pub async fn add_to_cart(&self, item: NewLineItem) -> Result<(), CartError> {
        let id = item.id.clone();
        let (quantity, pending) = self.mutate(|cart| cart.add(item)).await?;
        debug!(id = %id, quantity, "added to cart");
        pending.wait().await
    }

    /// Increase a line's quantity by 1.
    ///
    /// Returns `CartError::ItemNotFound` without touching storage if the ID is
    /// not in the cart.
    pub async fn increment(&self, id: &ProductId) -> Result<(), CartError> {
        let (quantity, pending) = self.mutate(|cart| cart.increment(id)).await?;
        debug!(id = %id, quantity, "incremented cart item");
        pending.wait().await
    }

    /// Decrease a line's quantity by 1, removing the line when it reaches 0.
    pub async fn decrement(&self, id: &ProductId) -> Result<(), CartError> {
        let (quantity, pending) = self.mutate(|cart| cart.decrement(id)).await?;
        match quantity {
            Some(quantity) => debug!(id = %id, quantity, "decremented cart item"),
            None => debug!(id = %id, "removed cart item"),
        }
        pending.wait().await
    }

    /// Empty the cart.
    pub async fn clear(&self) -> Result<(), CartError> {
        let ((), pending) = self.mutate(|cart| {
            cart.clear();
            Ok(())
        })
        .await?;
        debug!(key = %self.key, "cleared cart");
        pending.wait().await
    }

    /// Wait until every write issued so far has been applied.
    pub async fn flush(&self) -> Result<(), CartError> {
        self.writer.flush().await
    }

    /// Current items in display order.
    pub fn products(&self) -> Vec<LineItem> {
        self.cart.lock().items().to_vec()
    }

    /// A copy of the whole cart.
    pub fn snapshot(&self) -> Cart {
        self.cart.lock().clone()
    }

    /// Get an item by ID.
    pub fn get(&self, id: &ProductId) -> Option<LineItem> {
        self.cart.lock().get(id).cloned()
    }

    /// Sum of quantities.
    pub fn item_count(&self) -> u64 {
        self.cart.lock().item_count()
    }

    /// Sum of price times quantity.
    pub fn subtotal(&self) -> f64 {
        self.cart.lock().subtotal()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.cart.lock().is_empty()
    }

    /// Whether the last snapshot write failed, leaving storage behind the
    /// in-memory cart.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// The key the snapshot is stored under.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Apply `op` and enqueue the resulting snapshot while still holding the
    /// lock. Nothing is enqueued if `op` fails.
    async fn mutate<T, F>(&self, op: F) -> Result<(T, PendingWrite), CartError>
    where
        F: FnOnce(&mut Cart) -> Result<T, CartError>,
    {
        let _gate = self.gate.lock().await;
        let mut cart = self.cart.lock();
        let value = op(&mut cart)?;
        match self.writer.enqueue(cart.clone()) {
            Ok(pending) => Ok((value, pending)),
            Err(e) => {
                // The change is applied in memory but will never be written.
                self.dirty.store(true, Ordering::SeqCst);
                error!(key = %self.key, "write queue closed, cart change not persisted");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl CartHandle for CartStore {
    fn products(&self) -> Vec<LineItem> {
        CartStore::products(self)
    }

    async fn add_to_cart(&self, item: NewLineItem) -> Result<(), CartError> {
        CartStore::add_to_cart(self, item).await
    }

    async fn increment(&self, id: &ProductId) -> Result<(), CartError> {
        CartStore::increment(self, id).await
    }

    async fn decrement(&self, id: &ProductId) -> Result<(), CartError> {
        CartStore::decrement(self, id).await
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("cart", &*self.cart.lock())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

async fn read_snapshot(
    cache: &Cache<Arc<dyn KeyValueStore>>,
    key: &str,
    on_corrupt: CorruptSnapshotPolicy,
) -> Result<Cart, CartError> {
    match cache.get::<Cart>(key).await {
        Ok(Some(cart)) => Ok(cart),
        Ok(None) => Ok(Cart::new()),
        Err(CacheError::Serialize(e)) => match on_corrupt {
            CorruptSnapshotPolicy::Fail => Err(CartError::CorruptSnapshot {
                key: key.to_string(),
                source: Arc::new(e),
            }),
            CorruptSnapshotPolicy::Reset => {
                warn!(key, error = %e, "discarding corrupt cart snapshot");
                Ok(Cart::new())
            }
        },
        Err(e) => Err(e.into()),
    }
}
