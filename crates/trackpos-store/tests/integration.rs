//! Integration tests for the `Dragonfly` backend.
//!
//! These tests require a live Dragonfly (or Redis) instance. Run with:
//!
//! ```bash
//! docker run -d -p 6379:6379 docker.dragonflydb.io/dragonflydb/dragonfly
//! cargo test -p trackpos-store -- --ignored
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs. Each test uses its own key so they can run in
//! parallel against one instance.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use futures::future::join_all;
use trackpos_store::{DragonflyStore, PositionStore, StoreConfig, StoreError};

async fn connect() -> DragonflyStore {
    DragonflyStore::connect(&StoreConfig::default())
        .await
        .expect("Failed to connect to Dragonfly -- is it running on localhost:6379?")
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn dragonfly_absent_key_reads_zero() {
    let store = connect().await;
    let key = "trackpos:test:absent";
    store.delete(key).await.expect("Failed to delete");

    assert_eq!(store.get(key).await.expect("Failed to get"), 0);
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn dragonfly_incr_by_and_set() {
    let store = connect().await;
    let key = "trackpos:test:incr";
    store.delete(key).await.expect("Failed to delete");

    assert_eq!(store.incr_by(key, 50).await.expect("incr 50"), 50);
    assert_eq!(store.incr_by(key, -200).await.expect("incr -200"), -150);

    store.set(key, 0).await.expect("Failed to set");
    assert_eq!(store.get(key).await.expect("Failed to get"), 0);

    store.delete(key).await.expect("Failed to delete");
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn dragonfly_concurrent_increments_accumulate() {
    let store = PositionStore::Dragonfly(connect().await);
    let key = "trackpos:test:concurrent";
    store.set(key, 0).await.expect("Failed to reset");

    let tasks = (0..50).map(|i| {
        let store = store.clone();
        let delta = if i % 2 == 0 { 10 } else { -5 };
        async move { store.incr_by(key, delta).await }
    });
    for result in join_all(tasks).await {
        result.expect("increment failed");
    }

    assert_eq!(store.get(key).await.expect("Failed to get"), 125);
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn dragonfly_non_integer_value_is_rejected() {
    let store = connect().await;
    let key = "trackpos:test:garbage";
    let _: () = fred::prelude::KeysInterface::set(store.client(), key, "north", None, None, false)
        .await
        .expect("Failed to write garbage");

    let result = store.get(key).await;
    assert!(matches!(result, Err(StoreError::InvalidValue { .. })));

    store.delete(key).await.expect("Failed to delete");
}
