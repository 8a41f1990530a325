// src/models/session.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::question::PublicQuestion;

/// Client view of a running assessment session: the current question and
/// where the learner stands. Never exposes correct indices.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub request_id: Uuid,
    pub question_index: usize,
    pub total_questions: usize,
    pub remaining_seconds: u64,
    pub question: PublicQuestion,
}

/// DTO for submitting an answer to the current question.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    /// Selected option index (0-based).
    pub choice: i32,
}
