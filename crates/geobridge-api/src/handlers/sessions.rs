use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use geobridge_core::models::{SessionId, SessionStatus};
use geobridge_pipeline::{DesignRequest, PreparedSession};
use geojson::FeatureCollection;

use crate::error::ApiError;
use crate::state::AppState;

/// Download a design from the source system into a new session
pub async fn prepare_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DesignRequest>,
) -> Result<(StatusCode, Json<PreparedSession>), ApiError> {
    tracing::info!(
        project_id = %request.project_id,
        design_id = %request.design_id,
        "Preparing session"
    );

    let prepared = state.downloader.prepare(&request).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to prepare session");
        ApiError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(prepared)))
}

pub async fn session_status(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatus>, ApiError> {
    let session = parse_session(&session_id)?;
    Ok(Json(state.status.poll(&session).await?))
}

/// The cached design as 3D design-shape features
pub async fn session_design(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let session = parse_session(&session_id)?;
    let shape = state.downloader.design_shape(&session).await?;
    Ok(Json(shape))
}

fn parse_session(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse::<SessionId>()
        .map_err(|e| ApiError::bad_request("Invalid session id").with_details(e.to_string()))
}
