use geobridge_core::models::{SessionId, SessionKey};
use geobridge_core::ports::SessionStore;
use geobridge_core::Result;
use std::sync::Arc;
use std::time::Duration;

/// Records human-readable progress for a session.
///
/// Each line goes to the tracing stream and to the front of the session's log
/// list, so a poller reads the transcript newest first.
#[derive(Clone)]
pub struct ProgressLogger {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl ProgressLogger {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Append a progress line. A store failure is reported but never fails
    /// the caller's step.
    pub async fn log(&self, message: impl Into<String>, session: &SessionId) {
        let message = message.into();
        tracing::info!(session_id = %session, "{}", message);

        let key = SessionKey::Logs.for_session(session);
        if let Err(e) = self.store.push_front(&key, message, self.ttl).await {
            tracing::warn!(session_id = %session, error = %e, "Failed to record progress line");
        }
    }

    /// Transcript for a session, newest line first
    pub async fn transcript(&self, session: &SessionId) -> Result<Vec<String>> {
        self.store.list(&SessionKey::Logs.for_session(session)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySessionStore;

    #[tokio::test]
    async fn test_transcript_grows_newest_first() {
        let logger =
            ProgressLogger::new(Arc::new(MemorySessionStore::new()), Duration::from_secs(60));
        let session = SessionId::new();

        logger.log("Downloading design", &session).await;
        logger.log("Publishing layer", &session).await;

        assert_eq!(
            logger.transcript(&session).await.unwrap(),
            vec!["Publishing layer", "Downloading design"]
        );
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = Arc::new(MemorySessionStore::new());
        let logger = ProgressLogger::new(store, Duration::from_secs(60));
        let (a, b) = (SessionId::new(), SessionId::new());

        logger.log("only a", &a).await;

        assert_eq!(logger.transcript(&a).await.unwrap().len(), 1);
        assert!(logger.transcript(&b).await.unwrap().is_empty());
    }
}
