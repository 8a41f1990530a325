// src/models/expertise.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Latest proven competency of a subject on a topic.
/// Upserted on every completed assessment, pass or fail, so the most recent
/// attempt stays visible; keyed by (subject_id, topic_id), last write wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertiseRecord {
    pub subject_id: Uuid,
    pub topic_id: Uuid,

    /// 1..=4, derived from the assessment score.
    pub level: i32,

    pub score: i32,
    pub last_tested_at: DateTime<Utc>,
}
