//! Integration tests for `CacheStore` against an in-memory SQLite database.

use std::time::Duration;

use planscope_cache::CacheStore;
use planscope_core::CacheKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Payload {
    name: String,
    count: u32,
}

fn payload(name: &str, count: u32) -> Payload {
    Payload {
        name: name.to_string(),
        count,
    }
}

async fn store() -> CacheStore {
    CacheStore::open_in_memory()
        .await
        .expect("in-memory cache should open")
}

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::test]
async fn get_returns_what_was_set() {
    let store = store().await;
    let key = CacheKey::for_query(51.5074, -0.1278, 500);

    store.set(&key, &payload("a", 1), DAY).await;

    let hit: Option<Payload> = store.get(&key).await;
    assert_eq!(hit, Some(payload("a", 1)));
}

#[tokio::test]
async fn missing_key_is_a_miss() {
    let store = store().await;
    let hit: Option<Payload> = store.get(&CacheKey::from("nope")).await;
    assert!(hit.is_none());
}

#[tokio::test]
async fn set_overwrites_existing_entry() {
    let store = store().await;
    let key = CacheKey::from("k");

    store.set(&key, &payload("first", 1), DAY).await;
    store.set(&key, &payload("second", 2), DAY).await;

    let hit: Option<Payload> = store.get(&key).await;
    assert_eq!(hit, Some(payload("second", 2)));
    assert_eq!(store.stats().await.count, 1);
}

#[tokio::test]
async fn expired_entry_is_a_miss_and_then_gone() {
    let store = store().await;
    let key = CacheKey::from("stale");

    store.set(&key, &payload("old", 1), Duration::from_millis(1)).await;
    assert_eq!(store.stats().await.count, 1);

    tokio::time::sleep(Duration::from_millis(20)).await;

    let hit: Option<Payload> = store.get(&key).await;
    assert!(hit.is_none(), "expired entry must not be returned");
    assert_eq!(
        store.stats().await.count,
        0,
        "expired entry should be purged on read"
    );
}

#[tokio::test]
async fn delete_removes_single_entry() {
    let store = store().await;
    let a = CacheKey::from("a");
    let b = CacheKey::from("b");
    store.set(&a, &payload("a", 1), DAY).await;
    store.set(&b, &payload("b", 2), DAY).await;

    store.delete(&a).await;

    assert!(store.get::<Payload>(&a).await.is_none());
    assert_eq!(store.get::<Payload>(&b).await, Some(payload("b", 2)));
}

#[tokio::test]
async fn sweep_removes_only_expired_entries() {
    let store = store().await;
    store
        .set(&CacheKey::from("short-1"), &payload("s1", 1), Duration::from_millis(1))
        .await;
    store
        .set(&CacheKey::from("short-2"), &payload("s2", 2), Duration::from_millis(1))
        .await;
    store
        .set(&CacheKey::from("long"), &payload("l", 3), DAY)
        .await;

    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(store.sweep_expired().await, 2);
    assert_eq!(store.stats().await.count, 1);
    assert_eq!(store.sweep_expired().await, 0);
}

#[tokio::test]
async fn clear_empties_the_store() {
    let store = store().await;
    store.set(&CacheKey::from("a"), &payload("a", 1), DAY).await;
    store.set(&CacheKey::from("b"), &payload("b", 2), DAY).await;

    store.clear().await;

    let stats = store.stats().await;
    assert_eq!(stats.count, 0);
    assert!(stats.oldest_timestamp.is_none());
}

#[tokio::test]
async fn stats_reports_oldest_write() {
    let store = store().await;
    let before = chrono::Utc::now();
    store.set(&CacheKey::from("first"), &payload("a", 1), DAY).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.set(&CacheKey::from("second"), &payload("b", 2), DAY).await;

    let stats = store.stats().await;
    assert_eq!(stats.count, 2);
    let oldest = stats.oldest_timestamp.expect("oldest timestamp present");
    assert!(oldest.timestamp_millis() >= before.timestamp_millis());
    assert!(oldest <= chrono::Utc::now());
}

#[tokio::test]
async fn undecodable_entry_is_discarded() {
    let store = store().await;
    let key = CacheKey::from("shape-changed");
    store.set(&key, &"just a string", DAY).await;

    let hit: Option<Payload> = store.get(&key).await;
    assert!(hit.is_none());
    assert_eq!(store.stats().await.count, 0);
}

#[tokio::test]
async fn closed_store_degrades_to_miss() {
    let store = store().await;
    let key = CacheKey::from("k");
    store.set(&key, &payload("a", 1), DAY).await;

    store.close().await;

    // None of these may panic or propagate an error.
    assert!(store.get::<Payload>(&key).await.is_none());
    store.set(&key, &payload("b", 2), DAY).await;
    store.delete(&key).await;
    store.clear().await;
    assert_eq!(store.sweep_expired().await, 0);
    assert_eq!(store.stats().await.count, 0);
}

#[tokio::test]
async fn file_backed_store_persists_across_reopen() {
    let dir = std::env::temp_dir().join(format!(
        "planscope-cache-test-{}-{}",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let url = format!("sqlite://{}", dir.join("cache.db").display());
    let key = CacheKey::for_query(53.4808, -2.2426, 250);

    {
        let store = CacheStore::open(&url).await.expect("file cache should open");
        store.set(&key, &payload("persisted", 7), DAY).await;
        store.close().await;
    }

    let reopened = CacheStore::open(&url).await.expect("file cache should reopen");
    assert_eq!(reopened.get::<Payload>(&key).await, Some(payload("persisted", 7)));
    reopened.close().await;

    let _ = std::fs::remove_dir_all(&dir);
}
