// src/handlers/mastery.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::request::{ApproveMasteryRequest, CreateMasteryRequest, StatusQuery},
    state::AppState,
};

/// Creates a new certification request for a (subject, topic) pair.
/// Conflicts (terminal success, active request, referent exclusivity,
/// cooldown) surface as 409 with the reason.
pub async fn request_certification(
    State(state): State<AppState>,
    Json(req): Json<CreateMasteryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = state
        .lifecycle
        .request_certification(req.subject_id, req.topic_id)
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// Approves a pending request, attaching the generated quiz payload.
/// Approving twice is a no-op by design.
pub async fn approve(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(req): Json<ApproveMasteryRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.lifecycle.approve(request_id, req.quiz_data).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current presentation state for a pair, derived from the latest request.
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = state
        .lifecycle
        .status_for(query.subject_id, query.topic_id)
        .await?;

    Ok(Json(status))
}
