// src/handlers/assessment.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError, models::session::AnswerRequest, sessions::AnswerOutcome, state::AppState,
};

/// Starts the timed assessment for an approved request.
pub async fn start(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = state.lifecycle.get_request(request_id).await?;
    let view = state.sessions.start(request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Current question and countdown of a live session.
pub async fn view(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.sessions.view(request_id).await?;
    Ok(Json(view))
}

/// Submits the answer for the current question. Returns either the next
/// question view or, on the last question, the graded result.
pub async fn answer(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    match state.sessions.answer(request_id, req.choice).await? {
        AnswerOutcome::InProgress(view) => Ok(Json(json!({
            "finished": false,
            "session": view,
        }))),
        AnswerOutcome::Finished(summary) => Ok(Json(json!({
            "finished": true,
            "result": summary,
        }))),
    }
}

/// Abandons a running session. The timer is cancelled, no record is
/// created, and the owning request is untouched.
pub async fn abandon(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.abandon(request_id).await;
    Ok(StatusCode::NO_CONTENT)
}
