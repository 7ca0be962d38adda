use geobridge_core::models::SessionId;
use serde::Serialize;

const CHECK_BACK: &str = "Your migration has been queued, please check back in a few minutes";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok", service: "geobridge-api" }
    }
}

/// Answer to an accepted export or import
#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub session_id: SessionId,
    pub job: &'static str,
    pub message: &'static str,
}

impl EnqueueResponse {
    pub fn queued(session_id: SessionId, job: &'static str) -> Self {
        Self { session_id, job, message: CHECK_BACK }
    }
}
