//! In-memory session store for development and testing.
//!
//! Nothing survives a restart. For production workloads, use the PostgreSQL
//! backend.
//!
//! This implementation uses `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state.

use async_trait::async_trait;
use geobridge_core::ports::SessionStore;
use geobridge_core::Result;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum StoredValue {
    Text(String),
    List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: StoredValue,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory implementation of SessionStore with per-key expiry
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired key
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().unwrap().values().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value: StoredValue::Text(value),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().unwrap().insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let entries = self.entries.read().unwrap();
        Ok(entries.get(key).filter(|e| e.is_live(now)).and_then(|e| match &e.value {
            StoredValue::Text(text) => Some(text.clone()),
            StoredValue::List(_) => None,
        }))
    }

    async fn push_front(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap();

        let mut list = match entries.remove(key) {
            Some(Entry { value: StoredValue::List(list), expires_at }) if expires_at > now => list,
            _ => VecDeque::new(),
        };
        list.push_front(value);

        entries.insert(
            key.to_string(),
            Entry { value: StoredValue::List(list), expires_at: now + ttl },
        );
        Ok(())
    }

    async fn list(&self, key: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        let entries = self.entries.read().unwrap();
        Ok(match entries.get(key).filter(|e| e.is_live(now)) {
            Some(Entry { value: StoredValue::List(list), .. }) => list.iter().cloned().collect(),
            _ => Vec::new(),
        })
    }
}
