use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use geobridge_core::models::MigrationBatch;
use geobridge_pipeline::{Job, UnitOfWork};

use crate::dto::EnqueueResponse;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn enqueue_import(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<MigrationBatch>,
) -> Result<(StatusCode, Json<EnqueueResponse>), ApiError> {
    tracing::info!(
        session_id = %batch.session_id,
        format = ?batch.format,
        items = batch.items.len(),
        "Received import request"
    );

    batch.validate()?;

    let unit = UnitOfWork::ImportBatch(batch);
    let name = unit.name();
    let session_id = state.queue.enqueue(Job::new(unit, state.job_timeout))?;

    Ok((StatusCode::ACCEPTED, Json(EnqueueResponse::queued(session_id, name))))
}
