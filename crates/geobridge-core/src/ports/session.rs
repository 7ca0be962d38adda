use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Key-value store with per-key expiry
///
/// Writes are single-key; there is no cross-key transaction.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Set a string value and its time-to-live
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Get a live string value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Prepend to a list and refresh its time-to-live
    async fn push_front(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Read a live list, newest entry first
    async fn list(&self, key: &str) -> Result<Vec<String>>;
}
