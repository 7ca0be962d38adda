use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use geobridge_core::models::ExportSubmission;
use geobridge_pipeline::{Job, UnitOfWork};

use crate::dto::EnqueueResponse;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn enqueue_export(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<ExportSubmission>,
) -> Result<(StatusCode, Json<EnqueueResponse>), ApiError> {
    tracing::info!(
        session_id = %submission.session_id,
        design_id = %submission.design_id,
        web_map = submission.include_web_map,
        story = submission.include_story_map,
        "Received export request"
    );

    submission.validate()?;

    let unit = UnitOfWork::ExportDesign(submission);
    let name = unit.name();
    let session_id = state.queue.enqueue(Job::new(unit, state.job_timeout))?;

    Ok((StatusCode::ACCEPTED, Json(EnqueueResponse::queued(session_id, name))))
}
