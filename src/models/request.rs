// src/models/request.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle states of a mastery request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Completed => "completed",
        }
    }

    /// Maps a database value back to the enum. Unknown values are rejected
    /// by the caller rather than silently coerced.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "completed" => Some(RequestStatus::Completed),
            _ => None,
        }
    }
}

/// Final outcome of a completed assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Fail,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Fail => "fail",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Outcome::Success),
            "fail" => Some(Outcome::Fail),
            _ => None,
        }
    }
}

/// Represents one certification attempt for a (subject, topic) pair.
///
/// The row with the greatest `created_at` for a pair is the actionable one;
/// older rows are retained as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasteryRequest {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub topic_id: Uuid,
    pub status: RequestStatus,

    /// Present only once `status` is `completed`.
    pub outcome: Option<Outcome>,

    /// 0..=100, completed only.
    pub score: Option<i32>,

    /// Submitted option indices, one per question. `-1` marks a timeout.
    pub answers: Option<Vec<i32>>,

    /// Raw quiz payload attached at approval time.
    pub quiz_data: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl MasteryRequest {
    /// A passed request is terminal: no further request may be created for
    /// the pair while it stands.
    pub fn is_terminal_success(&self) -> bool {
        self.status == RequestStatus::Completed && self.outcome == Some(Outcome::Success)
    }

    /// Pending or approved: an attempt cycle is still underway.
    pub fn is_active(&self) -> bool {
        matches!(self.status, RequestStatus::Pending | RequestStatus::Approved)
    }

    pub fn is_failed(&self) -> bool {
        self.status == RequestStatus::Completed && self.outcome == Some(Outcome::Fail)
    }
}

/// DTO for creating a new mastery request.
#[derive(Debug, Deserialize)]
pub struct CreateMasteryRequest {
    pub subject_id: Uuid,
    pub topic_id: Uuid,
}

/// DTO for approving a pending request.
/// The quiz payload generated for the learner rides along with the approval.
#[derive(Debug, Deserialize, Default)]
pub struct ApproveMasteryRequest {
    pub quiz_data: Option<serde_json::Value>,
}

/// DTO for the status lookup query string.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub subject_id: Uuid,
    pub topic_id: Uuid,
}
