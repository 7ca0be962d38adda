//! PostgreSQL session store against a live database
//!
//! Set `GEOBRIDGE_TEST_DATABASE_URL` to run these; without it every test
//! returns early.

use geobridge_core::ports::SessionStore;
use geobridge_store::{PostgresConfig, PostgresSessionStore, SessionCache};
use std::sync::Arc;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

async fn store() -> Option<PostgresSessionStore> {
    let url = std::env::var("GEOBRIDGE_TEST_DATABASE_URL").ok()?;
    let config = PostgresConfig::new(url).unwrap();
    Some(PostgresSessionStore::connect(config).await.unwrap())
}

fn key(suffix: &str) -> String {
    format!("{}_{}", uuid::Uuid::new_v4(), suffix)
}

#[tokio::test]
async fn test_set_get_and_overwrite() {
    let Some(store) = store().await else { return };
    let k = key("design");

    assert_eq!(store.get(&k).await.unwrap(), None);
    store.set(&k, "one".to_string(), HOUR).await.unwrap();
    store.set(&k, "two".to_string(), HOUR).await.unwrap();

    assert_eq!(store.get(&k).await.unwrap(), Some("two".to_string()));
}

#[tokio::test]
async fn test_expired_key_is_invisible_and_purged() {
    let Some(store) = store().await else { return };
    let k = key("status");

    store.set(&k, "done".to_string(), Duration::ZERO).await.unwrap();

    assert_eq!(store.get(&k).await.unwrap(), None);
    assert!(store.purge_expired().await.unwrap() >= 1);
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let Some(store) = store().await else { return };
    let k = format!("session_logs:{}", uuid::Uuid::new_v4());

    for line in ["first", "second", "third"] {
        store.push_front(&k, line.to_string(), HOUR).await.unwrap();
    }

    assert_eq!(store.list(&k).await.unwrap(), vec!["third", "second", "first"]);
}

#[tokio::test]
async fn test_push_after_expiry_starts_fresh() {
    let Some(store) = store().await else { return };
    let k = key("logs");

    store.push_front(&k, "stale".to_string(), Duration::ZERO).await.unwrap();
    assert!(store.list(&k).await.unwrap().is_empty());

    store.push_front(&k, "fresh".to_string(), HOUR).await.unwrap();
    assert_eq!(store.list(&k).await.unwrap(), vec!["fresh"]);
}

#[tokio::test]
async fn test_text_and_list_replace_each_other() {
    let Some(store) = store().await else { return };
    let k = key("mixed");

    store.push_front(&k, "line".to_string(), HOUR).await.unwrap();
    store.set(&k, "text".to_string(), HOUR).await.unwrap();
    assert!(store.list(&k).await.unwrap().is_empty());
    assert_eq!(store.get(&k).await.unwrap(), Some("text".to_string()));

    store.push_front(&k, "again".to_string(), HOUR).await.unwrap();
    assert_eq!(store.get(&k).await.unwrap(), None);
    assert_eq!(store.list(&k).await.unwrap(), vec!["again"]);
}

#[tokio::test]
async fn test_status_survives_a_new_connection() {
    let Some(first) = store().await else { return };
    let session = geobridge_core::models::SessionId::new();
    let cache = SessionCache::new(Arc::new(first), HOUR, HOUR);
    cache
        .write_status(&session, &geobridge_core::models::PublishResult::duplicate())
        .await
        .unwrap();

    let Some(second) = store().await else { return };
    let reopened = SessionCache::new(Arc::new(second), HOUR, HOUR);
    let status = reopened.read_status(&session).await.unwrap().unwrap();
    assert_eq!(status.message, "duplicate");
}
