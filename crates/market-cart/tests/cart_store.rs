//! End-to-end behavior of the cart store against real key-value backends.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use market_cart::prelude::*;
use market_kv::{CacheError, FileStore, KeyValueStore, MemoryStore};

const KEY: &str = "@GoMarketplace:cart";

fn shirt() -> NewLineItem {
    NewLineItem::new("p1", "Shirt", "u", 10.0)
}

fn mug() -> NewLineItem {
    NewLineItem::new("p2", "Mug", "https://img/mug.png", 4.5)
}

fn p1() -> ProductId {
    ProductId::new("p1")
}

async fn load(store: &MemoryStore) -> CartStore {
    CartStore::load(store.clone(), CartConfig::default())
        .await
        .unwrap()
}

async fn persisted(store: &MemoryStore) -> Vec<LineItem> {
    let bytes = store.get(KEY).await.unwrap().expect("snapshot written");
    serde_json::from_slice(&bytes).unwrap()
}

/// Store whose writes fail while `failing` is set.
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: Arc<AtomicBool>,
    set_calls: Arc<AtomicU32>,
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Store("disk full".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.inner.keys().await
    }
}

/// Store whose reads take `delay_ms` to complete.
#[derive(Clone, Default)]
struct SlowReadStore {
    inner: MemoryStore,
    delay_ms: Arc<AtomicU32>,
}

#[async_trait]
impl KeyValueStore for SlowReadStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(u64::from(delay))).await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.inner.keys().await
    }
}

#[tokio::test]
async fn add_to_empty_store() {
    let store = MemoryStore::new();
    let cart = load(&store).await;

    cart.add_to_cart(shirt()).await.unwrap();

    let expected = vec![shirt().with_quantity(1)];
    assert_eq!(cart.products(), expected);
    assert_eq!(persisted(&store).await, expected);
}

#[tokio::test]
async fn adding_twice_merges_into_one_line() {
    let store = MemoryStore::new();
    let cart = load(&store).await;

    cart.add_to_cart(shirt()).await.unwrap();
    cart.add_to_cart(shirt()).await.unwrap();

    assert_eq!(cart.products(), vec![shirt().with_quantity(2)]);
    assert_eq!(persisted(&store).await, vec![shirt().with_quantity(2)]);
}

#[tokio::test]
async fn distinct_items_keep_insertion_order() {
    let store = MemoryStore::new();
    let cart = load(&store).await;

    cart.add_to_cart(shirt()).await.unwrap();
    cart.add_to_cart(mug()).await.unwrap();

    let ids: Vec<_> = cart.products().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![ProductId::new("p1"), ProductId::new("p2")]);
}

#[tokio::test]
async fn increment_from_one_to_two() {
    let store = MemoryStore::new();
    let cart = load(&store).await;
    cart.add_to_cart(shirt()).await.unwrap();

    cart.increment(&p1()).await.unwrap();

    assert_eq!(cart.products(), vec![shirt().with_quantity(2)]);
    assert_eq!(persisted(&store).await, vec![shirt().with_quantity(2)]);
}

#[tokio::test]
async fn decrement_from_two_to_one() {
    let store = MemoryStore::new();
    let cart = load(&store).await;
    cart.add_to_cart(shirt()).await.unwrap();
    cart.add_to_cart(shirt()).await.unwrap();
    cart.add_to_cart(mug()).await.unwrap();

    cart.decrement(&p1()).await.unwrap();

    let expected = vec![shirt().with_quantity(1), mug().with_quantity(1)];
    assert_eq!(cart.products(), expected);
    assert_eq!(persisted(&store).await, expected);
}

#[tokio::test]
async fn decrement_at_one_removes_line_and_persists_shorter_cart() {
    let store = MemoryStore::new();
    let cart = load(&store).await;
    cart.add_to_cart(shirt()).await.unwrap();

    cart.decrement(&p1()).await.unwrap();

    assert!(cart.products().is_empty());
    assert!(cart.get(&p1()).is_none());
    assert!(persisted(&store).await.is_empty());
}

#[tokio::test]
async fn persisted_cart_round_trips_through_load() {
    let store = MemoryStore::new();
    let cart = load(&store).await;
    cart.add_to_cart(shirt()).await.unwrap();
    cart.add_to_cart(mug()).await.unwrap();
    cart.increment(&p1()).await.unwrap();
    let before = cart.snapshot();
    drop(cart);

    let reloaded = load(&store).await;
    assert_eq!(reloaded.snapshot(), before);
    assert_eq!(reloaded.item_count(), 3);
    assert!((reloaded.subtotal() - 24.5).abs() < 1e-9);
}

#[tokio::test]
async fn repeated_reload_is_stable() {
    let store = MemoryStore::new();
    let cart = load(&store).await;
    cart.add_to_cart(shirt()).await.unwrap();
    cart.add_to_cart(mug()).await.unwrap();

    cart.reload().await.unwrap();
    let first = cart.snapshot();
    cart.reload().await.unwrap();

    assert_eq!(cart.snapshot(), first);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn mutation_during_reload_is_kept() {
    let store = SlowReadStore::default();
    let cart = Arc::new(
        CartStore::load(store.clone(), CartConfig::default())
            .await
            .unwrap(),
    );
    cart.add_to_cart(shirt()).await.unwrap();

    store.delay_ms.store(100, Ordering::SeqCst);
    let reload = {
        let cart = cart.clone();
        tokio::spawn(async move { cart.reload().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    cart.increment(&p1()).await.unwrap();
    reload.await.unwrap().unwrap();

    store.delay_ms.store(0, Ordering::SeqCst);
    let bytes = store.inner.get(KEY).await.unwrap().unwrap();
    let saved: Vec<LineItem> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(cart.products(), vec![shirt().with_quantity(2)]);
    assert_eq!(saved, cart.products());
}

#[tokio::test]
async fn non_finite_price_is_rejected_and_cart_stays_loadable() {
    let store = MemoryStore::new();
    let cart = load(&store).await;
    cart.add_to_cart(shirt()).await.unwrap();

    let err = cart
        .add_to_cart(NewLineItem::new("p3", "Broken", "b", f64::NAN))
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::InvalidPrice(_)));
    let err = cart
        .add_to_cart(NewLineItem::new("p4", "Broken", "b", f64::INFINITY))
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::InvalidPrice(_)));
    drop(cart);

    let reloaded = load(&store).await;
    assert_eq!(reloaded.products(), vec![shirt().with_quantity(1)]);
}

#[tokio::test]
async fn loads_snapshot_written_by_another_client() {
    let store = MemoryStore::new();
    let raw = r#"[{"id":"p1","title":"Shirt","image_url":"u","price":10,"quantity":3}]"#;
    store.set(KEY, raw.as_bytes()).await.unwrap();

    let cart = load(&store).await;

    assert_eq!(cart.products(), vec![shirt().with_quantity(3)]);
}

#[tokio::test]
async fn back_to_back_mutations_leave_latest_state_persisted() {
    let store = MemoryStore::new();
    let cart = Arc::new(load(&store).await);
    cart.add_to_cart(shirt()).await.unwrap();

    // Issue several mutations without awaiting each write in turn.
    let ops = vec![
        {
            let cart = cart.clone();
            tokio::spawn(async move { cart.increment(&p1()).await })
        },
        {
            let cart = cart.clone();
            tokio::spawn(async move { cart.add_to_cart(mug()).await })
        },
        {
            let cart = cart.clone();
            tokio::spawn(async move { cart.increment(&p1()).await })
        },
    ];
    for op in ops {
        op.await.unwrap().unwrap();
    }

    cart.flush().await.unwrap();
    assert_eq!(persisted(&store).await, cart.products());
    assert_eq!(cart.get(&p1()).unwrap().quantity, 3);
}

#[tokio::test]
async fn corrupt_snapshot_fails_load_by_default() {
    let store = MemoryStore::new();
    store.set(KEY, b"{not json").await.unwrap();

    let err = CartStore::load(store, CartConfig::default())
        .await
        .unwrap_err();

    match err {
        CartError::CorruptSnapshot { key, .. } => assert_eq!(key, KEY),
        other => panic!("expected CorruptSnapshot, got {other:?}"),
    }
}

#[tokio::test]
async fn snapshot_with_duplicate_ids_is_corrupt() {
    let store = MemoryStore::new();
    let raw = r#"[
        {"id":"p1","title":"Shirt","image_url":"u","price":10,"quantity":1},
        {"id":"p1","title":"Shirt","image_url":"u","price":10,"quantity":1}
    ]"#;
    store.set(KEY, raw.as_bytes()).await.unwrap();

    let result = CartStore::load(store, CartConfig::default()).await;
    assert!(matches!(result, Err(CartError::CorruptSnapshot { .. })));
}

#[tokio::test]
async fn corrupt_snapshot_reset_policy_starts_empty() {
    let store = MemoryStore::new();
    store.set(KEY, b"garbage").await.unwrap();
    let config = CartConfig::default().with_on_corrupt(CorruptSnapshotPolicy::Reset);

    let cart = CartStore::load(store.clone(), config).await.unwrap();
    assert!(cart.is_empty());

    cart.add_to_cart(shirt()).await.unwrap();
    assert_eq!(persisted(&store).await, vec![shirt().with_quantity(1)]);
}

#[tokio::test]
async fn failed_write_is_reported_and_marks_cart_dirty() {
    let store = FlakyStore::default();
    let config = CartConfig::default().with_retry(
        RetryPolicy::new(2).with_backoff(BackoffStrategy::Fixed { delay_ms: 1 }),
    );
    let cart = CartStore::load(store.clone(), config).await.unwrap();

    store.failing.store(true, Ordering::SeqCst);
    let err = cart.add_to_cart(shirt()).await.unwrap_err();

    assert!(matches!(err, CartError::Persist { attempts: 3, .. }));
    assert_eq!(store.set_calls.load(Ordering::SeqCst), 3);
    assert!(cart.is_dirty());
    // The in-memory update stands even though the write failed.
    assert_eq!(cart.products(), vec![shirt().with_quantity(1)]);

    store.failing.store(false, Ordering::SeqCst);
    cart.increment(&p1()).await.unwrap();

    assert!(!cart.is_dirty());
    let bytes = store.inner.get(KEY).await.unwrap().unwrap();
    let saved: Vec<LineItem> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(saved, vec![shirt().with_quantity(2)]);
}

#[tokio::test]
async fn reload_refuses_to_discard_unsaved_changes() {
    let store = FlakyStore::default();
    let cart = CartStore::load(
        store.clone(),
        CartConfig::default().with_retry(RetryPolicy::none()),
    )
    .await
    .unwrap();

    store.failing.store(true, Ordering::SeqCst);
    assert!(cart.add_to_cart(shirt()).await.is_err());

    assert!(matches!(
        cart.reload().await,
        Err(CartError::Persist { .. })
    ));
    assert_eq!(cart.products().len(), 1);
}

#[tokio::test]
async fn consumers_use_the_handle_through_the_context() {
    let store = MemoryStore::new();
    let context = CartContext::new();
    assert!(matches!(context.cart(), Err(CartError::MissingProvider)));

    context.provide(load(&store).await).unwrap();

    let handle: Arc<dyn CartHandle> = context.cart().unwrap();
    handle.add_to_cart(shirt()).await.unwrap();
    handle.increment(&p1()).await.unwrap();
    handle.decrement(&p1()).await.unwrap();

    assert_eq!(handle.products(), vec![shirt().with_quantity(1)]);
}

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileStore::open(dir.path()).await.unwrap();
        let cart = CartStore::load(store, CartConfig::default()).await.unwrap();
        cart.add_to_cart(shirt()).await.unwrap();
        cart.add_to_cart(mug()).await.unwrap();
        cart.add_to_cart(mug()).await.unwrap();
    }

    let store = FileStore::open(dir.path()).await.unwrap();
    let cart = CartStore::load(store, CartConfig::default()).await.unwrap();

    assert_eq!(
        cart.products(),
        vec![shirt().with_quantity(1), mug().with_quantity(2)]
    );
}
