// src/store/mod.rs

pub mod pg;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::expertise::ExpertiseRecord;
use crate::models::request::{MasteryRequest, Outcome};

/// Persistent lifecycle of mastery requests.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Creates a new `pending` request for the pair.
    async fn create(&self, subject_id: Uuid, topic_id: Uuid) -> Result<MasteryRequest, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<MasteryRequest>, AppError>;

    /// The request with the greatest `created_at` for the pair, if any.
    /// That row alone determines the learner's current certification state.
    async fn latest_for(
        &self,
        subject_id: Uuid,
        topic_id: Uuid,
    ) -> Result<Option<MasteryRequest>, AppError>;

    /// Transitions `pending` to `approved`, attaching the quiz payload.
    /// Returns `false` when the request was not pending (no-op).
    async fn approve(
        &self,
        id: Uuid,
        quiz_data: Option<serde_json::Value>,
    ) -> Result<bool, AppError>;

    /// Marks the request `completed` with its outcome. Only the coordinator
    /// calls this.
    async fn update_outcome(
        &self,
        id: Uuid,
        outcome: Outcome,
        score: i32,
        answers: &[i32],
        completed_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// Latest proven competency per (subject, topic), last write wins.
#[async_trait]
pub trait ExpertiseStore: Send + Sync {
    async fn upsert(&self, record: &ExpertiseRecord) -> Result<(), AppError>;
}

/// One-way channel to the approver. No shared state, no read path.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_approver(
        &self,
        topic_id: Uuid,
        subject_id: Uuid,
        score: i32,
    ) -> Result<(), AppError>;
}

/// XP accounting. `grant` must be idempotent on `idempotency_key`.
#[async_trait]
pub trait RewardLedger: Send + Sync {
    async fn grant(
        &self,
        subject_id: Uuid,
        amount: i32,
        idempotency_key: &str,
        reason: &str,
    ) -> Result<(), AppError>;
}

/// Read-only view of topic referent assignments, owned elsewhere.
#[async_trait]
pub trait ReferentLookup: Send + Sync {
    async fn assigned_expert(&self, topic_id: Uuid) -> Result<Option<Uuid>, AppError>;
}
