//! Typed access to the artifacts a session owns in the session store.

use geobridge_core::config::LayeredConfig;
use geobridge_core::models::{DesignRecord, ProjectTag, PublishResult, SessionId, SessionKey};
use geobridge_core::ports::SessionStore;
use geobridge_core::{BridgeError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Session cache over a raw key-value store
///
/// Every write is a single `set` with its own expiry. A reader can observe a
/// cached design before the matching tags land.
#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn SessionStore>,
    design_ttl: Duration,
    status_ttl: Duration,
}

impl SessionCache {
    pub fn new(store: Arc<dyn SessionStore>, design_ttl: Duration, status_ttl: Duration) -> Self {
        Self { store, design_ttl, status_ttl }
    }

    pub fn from_config(store: Arc<dyn SessionStore>, config: &LayeredConfig) -> Self {
        Self::new(store, config.design_ttl(), config.status_ttl())
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub async fn cache_design(&self, session: &SessionId, design: &DesignRecord) -> Result<()> {
        self.put(SessionKey::Design, session, design, self.design_ttl).await
    }

    /// Load the cached design; a missing or expired key is an error
    pub async fn load_design(&self, session: &SessionId) -> Result<DesignRecord> {
        let key = SessionKey::Design.for_session(session);
        self.fetch(&key).await?.ok_or(BridgeError::SessionMissing { key })
    }

    pub async fn cache_tags(&self, session: &SessionId, tags: &[ProjectTag]) -> Result<()> {
        self.put(SessionKey::Tags, session, tags, self.design_ttl).await
    }

    pub async fn load_tags(&self, session: &SessionId) -> Result<Option<Vec<ProjectTag>>> {
        self.fetch(&SessionKey::Tags.for_session(session)).await
    }

    pub async fn write_status(&self, session: &SessionId, result: &PublishResult) -> Result<()> {
        self.put(SessionKey::Status, session, result, self.status_ttl).await
    }

    pub async fn read_status(&self, session: &SessionId) -> Result<Option<PublishResult>> {
        self.fetch(&SessionKey::Status.for_session(session)).await
    }

    async fn put<T: Serialize + ?Sized>(
        &self,
        key: SessionKey,
        session: &SessionId,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        self.store.set(&key.for_session(session), payload, ttl).await
    }

    async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySessionStore;
    use geojson::FeatureCollection;

    fn cache() -> SessionCache {
        SessionCache::new(
            Arc::new(MemorySessionStore::new()),
            Duration::from_secs(60),
            Duration::from_secs(60),
        )
    }

    fn design() -> DesignRecord {
        DesignRecord {
            design_id: "s9".to_string(),
            design_team_id: "t3".to_string(),
            project_id: "p1".to_string(),
            design_name: "Final".to_string(),
            feature_collection: FeatureCollection {
                bbox: None,
                features: vec![],
                foreign_members: None,
            },
        }
    }

    #[tokio::test]
    async fn test_design_roundtrip() {
        let cache = cache();
        let session = SessionId::new();
        cache.cache_design(&session, &design()).await.unwrap();

        assert_eq!(cache.load_design(&session).await.unwrap(), design());
    }

    #[tokio::test]
    async fn test_missing_design_reports_key() {
        let session = SessionId::new();
        match cache().load_design(&session).await {
            Err(BridgeError::SessionMissing { key }) => assert!(key.ends_with("_design")),
            other => panic!("expected missing session, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_design_without_tags_is_tolerated() {
        let cache = cache();
        let session = SessionId::new();
        cache.cache_design(&session, &design()).await.unwrap();

        assert!(cache.load_tags(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status_roundtrip() {
        let cache = cache();
        let session = SessionId::new();
        assert!(cache.read_status(&session).await.unwrap().is_none());

        cache.write_status(&session, &PublishResult::duplicate()).await.unwrap();
        let status = cache.read_status(&session).await.unwrap().unwrap();
        assert!(status.is_duplicate());
    }
}
