// src/store/pg.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::expertise::ExpertiseRecord;
use crate::models::request::{MasteryRequest, Outcome, RequestStatus};
use crate::store::{ExpertiseStore, NotificationSink, ReferentLookup, RequestStore, RewardLedger};

// Runtime (non-macro) queries throughout: the crate must build without a
// live database, so no compile-time query checking here.

/// Raw `mastery_requests` row; status/outcome/answers are decoded after the
/// fetch so invalid rows surface as persistence errors instead of panics.
#[derive(sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    subject_id: Uuid,
    topic_id: Uuid,
    status: String,
    outcome: Option<String>,
    score: Option<i32>,
    answers: Option<serde_json::Value>,
    quiz_data: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<RequestRow> for MasteryRequest {
    type Error = AppError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let status = RequestStatus::parse(&row.status).ok_or_else(|| {
            AppError::Persistence(format!("Unknown request status '{}'", row.status))
        })?;

        let outcome = match row.outcome.as_deref() {
            Some(s) => Some(
                Outcome::parse(s)
                    .ok_or_else(|| AppError::Persistence(format!("Unknown outcome '{}'", s)))?,
            ),
            None => None,
        };

        let answers = match row.answers {
            Some(value) => Some(serde_json::from_value::<Vec<i32>>(value).map_err(|e| {
                AppError::Persistence(format!("Malformed answers column: {}", e))
            })?),
            None => None,
        };

        Ok(MasteryRequest {
            id: row.id,
            subject_id: row.subject_id,
            topic_id: row.topic_id,
            status,
            outcome,
            score: row.score,
            answers,
            quiz_data: row.quiz_data,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

const REQUEST_COLUMNS: &str = "id, subject_id, topic_id, status, outcome, score, answers, quiz_data, created_at, completed_at";

#[derive(Clone)]
pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn create(&self, subject_id: Uuid, topic_id: Uuid) -> Result<MasteryRequest, AppError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO mastery_requests (id, subject_id, topic_id, status, created_at)
             VALUES ($1, $2, $3, 'pending', $4)",
        )
        .bind(id)
        .bind(subject_id)
        .bind(topic_id)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert mastery request: {:?}", e);
            AppError::from(e)
        })?;

        Ok(MasteryRequest {
            id,
            subject_id,
            topic_id,
            status: RequestStatus::Pending,
            outcome: None,
            score: None,
            answers: None,
            quiz_data: None,
            created_at,
            completed_at: None,
        })
    }

    async fn get(&self, id: Uuid) -> Result<Option<MasteryRequest>, AppError> {
        let row: Option<RequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM mastery_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MasteryRequest::try_from).transpose()
    }

    async fn latest_for(
        &self,
        subject_id: Uuid,
        topic_id: Uuid,
    ) -> Result<Option<MasteryRequest>, AppError> {
        let row: Option<RequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM mastery_requests
             WHERE subject_id = $1 AND topic_id = $2
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(subject_id)
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MasteryRequest::try_from).transpose()
    }

    async fn approve(
        &self,
        id: Uuid,
        quiz_data: Option<serde_json::Value>,
    ) -> Result<bool, AppError> {
        // Only a pending request may be approved; re-approval is a no-op.
        let result = sqlx::query(
            "UPDATE mastery_requests
             SET status = 'approved', quiz_data = COALESCE($2, quiz_data)
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(quiz_data)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_outcome(
        &self,
        id: Uuid,
        outcome: Outcome,
        score: i32,
        answers: &[i32],
        completed_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE mastery_requests
             SET status = 'completed', outcome = $2, score = $3, answers = $4, completed_at = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(outcome.as_str())
        .bind(score)
        .bind(serde_json::json!(answers))
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to persist outcome for request {}: {:?}", id, e);
            AppError::from(e)
        })?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct PgExpertiseStore {
    pool: PgPool,
}

impl PgExpertiseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpertiseStore for PgExpertiseStore {
    async fn upsert(&self, record: &ExpertiseRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_expertise (subject_id, topic_id, level, score, last_tested_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (subject_id, topic_id) DO UPDATE SET
                 level = EXCLUDED.level,
                 score = EXCLUDED.score,
                 last_tested_at = EXCLUDED.last_tested_at",
        )
        .bind(record.subject_id)
        .bind(record.topic_id)
        .bind(record.level)
        .bind(record.score)
        .bind(record.last_tested_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct PgNotificationSink {
    pool: PgPool,
}

impl PgNotificationSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn notify_approver(
        &self,
        topic_id: Uuid,
        subject_id: Uuid,
        score: i32,
    ) -> Result<(), AppError> {
        let content = format!(
            "Mastery assessment completed on topic {} by {} with a score of {}%.",
            topic_id, subject_id, score
        );

        sqlx::query(
            "INSERT INTO notifications (id, topic_id, subject_id, score, content, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(topic_id)
        .bind(subject_id)
        .bind(score)
        .bind(content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct PgRewardLedger {
    pool: PgPool,
}

impl PgRewardLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardLedger for PgRewardLedger {
    async fn grant(
        &self,
        subject_id: Uuid,
        amount: i32,
        idempotency_key: &str,
        reason: &str,
    ) -> Result<(), AppError> {
        // The unique key makes replays harmless: the grant row insert either
        // lands once or not at all, and the XP increment follows the insert.
        let inserted = sqlx::query(
            "INSERT INTO xp_grants (idempotency_key, subject_id, amount, reason, granted_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (idempotency_key) DO NOTHING",
        )
        .bind(idempotency_key)
        .bind(subject_id)
        .bind(amount)
        .bind(reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            tracing::debug!("XP grant {} already recorded, skipping", idempotency_key);
            return Ok(());
        }

        sqlx::query(
            "INSERT INTO user_xp (subject_id, xp)
             VALUES ($1, $2)
             ON CONFLICT (subject_id) DO UPDATE SET xp = user_xp.xp + EXCLUDED.xp",
        )
        .bind(subject_id)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct PgReferentLookup {
    pool: PgPool,
}

impl PgReferentLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferentLookup for PgReferentLookup {
    async fn assigned_expert(&self, topic_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let subject_id: Option<Uuid> =
            sqlx::query_scalar("SELECT subject_id FROM topic_referents WHERE topic_id = $1")
                .bind(topic_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(subject_id)
    }
}
