use geobridge_core::models::{SessionId, SessionStatus};
use geobridge_core::Result;
use geobridge_store::{ProgressLogger, SessionCache};

/// Read-only view of a session for polling clients
#[derive(Clone)]
pub struct StatusReader {
    cache: SessionCache,
    logger: ProgressLogger,
}

impl StatusReader {
    pub fn new(cache: SessionCache, logger: ProgressLogger) -> Self {
        Self { cache, logger }
    }

    /// Current status plus the transcript, newest line first. A session
    /// without a status key is still in progress.
    pub async fn poll(&self, session: &SessionId) -> Result<SessionStatus> {
        let logs = self.logger.transcript(session).await?;
        Ok(match self.cache.read_status(session).await? {
            Some(result) => SessionStatus::finished(result, logs),
            None => SessionStatus::in_progress(logs),
        })
    }
}
