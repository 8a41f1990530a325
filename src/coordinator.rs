// src/coordinator.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::assessment::AssessmentResult;
use crate::error::AppError;
use crate::models::expertise::ExpertiseRecord;
use crate::models::request::{MasteryRequest, Outcome, RequestStatus};
use crate::store::{ExpertiseStore, NotificationSink, RequestStore, RewardLedger};

/// Completion result reported back to the learner.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizeSummary {
    pub request_id: Uuid,
    pub score: i32,
    pub level: i32,
    pub outcome: Outcome,
    pub reward_xp: i32,

    /// False when a side-effect step failed: the assessment is graded but
    /// the results may not be fully synced yet.
    pub synced: bool,
}

/// Just-completed request snapshots, visible to readers before the
/// persistence write is confirmed.
///
/// Guards the race between the coordinator's write and a concurrent
/// background refresh: a stale store read can never un-complete a finished
/// request. An entry is dropped once the write is confirmed, and is
/// superseded the moment the store copy itself reports `completed` (a
/// version check, not a timed reset). An entry whose write never succeeds
/// is retained for the life of the process: it is the only completed
/// record of that request.
#[derive(Default)]
pub struct CompletionOverlay {
    inner: Mutex<HashMap<Uuid, MasteryRequest>>,
}

impl CompletionOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    async fn publish(&self, request: MasteryRequest) {
        self.inner.lock().await.insert(request.id, request);
    }

    async fn confirm(&self, id: Uuid) {
        self.inner.lock().await.remove(&id);
    }

    /// Overlays a fresh store read. Returns the completed snapshot while the
    /// store copy lags behind; prefers the store copy as soon as it has
    /// caught up.
    pub async fn apply(&self, fetched: Option<MasteryRequest>) -> Option<MasteryRequest> {
        let request = fetched?;
        let mut inner = self.inner.lock().await;

        match inner.get(&request.id) {
            Some(snapshot) if request.status != RequestStatus::Completed => {
                Some(snapshot.clone())
            }
            Some(_) => {
                // Store has caught up, the snapshot is stale.
                inner.remove(&request.id);
                Some(request)
            }
            None => Some(request),
        }
    }
}

/// Sequences the side-effects of a finished assessment: persist the outcome,
/// upsert expertise, notify the approver, grant the XP reward. Runs at most
/// once per request id; individual failures are logged and tolerated, never
/// rolled back.
pub struct Coordinator {
    requests: Arc<dyn RequestStore>,
    expertise: Arc<dyn ExpertiseStore>,
    notifications: Arc<dyn NotificationSink>,
    rewards: Arc<dyn RewardLedger>,
    overlay: Arc<CompletionOverlay>,

    /// One id per in-process finalize, kept for the life of the process.
    /// Bounded by the number of assessments completed since startup.
    finalized: Mutex<HashSet<Uuid>>,
}

impl Coordinator {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        expertise: Arc<dyn ExpertiseStore>,
        notifications: Arc<dyn NotificationSink>,
        rewards: Arc<dyn RewardLedger>,
        overlay: Arc<CompletionOverlay>,
    ) -> Self {
        Self {
            requests,
            expertise,
            notifications,
            rewards,
            overlay,
            finalized: Mutex::new(HashSet::new()),
        }
    }

    /// Finalizes one assessment. A second invocation for the same request id
    /// returns `DuplicateSubmission`, which callers discard.
    pub async fn finalize(
        &self,
        request: &MasteryRequest,
        result: &AssessmentResult,
    ) -> Result<FinalizeSummary, AppError> {
        {
            let mut finalized = self.finalized.lock().await;
            if request.status == RequestStatus::Completed || !finalized.insert(request.id) {
                tracing::debug!(
                    "Duplicate finalize for request {}, ignoring",
                    request.id
                );
                return Err(AppError::DuplicateSubmission(format!(
                    "Request {} is already finalized",
                    request.id
                )));
            }
        }

        let completed_at = Utc::now();
        let mut synced = true;

        // Publish the optimistic completed view before writing, so a
        // concurrent refresh cannot show the request as still approved.
        let mut completed = request.clone();
        completed.status = RequestStatus::Completed;
        completed.outcome = Some(result.outcome);
        completed.score = Some(result.score);
        completed.answers = Some(result.answers.clone());
        completed.completed_at = Some(completed_at);
        self.overlay.publish(completed).await;

        // 1. Persist the outcome on the request.
        match self
            .requests
            .update_outcome(
                request.id,
                result.outcome,
                result.score,
                &result.answers,
                completed_at,
            )
            .await
        {
            Ok(()) => self.overlay.confirm(request.id).await,
            Err(e) => {
                tracing::warn!(
                    "Failed to persist outcome for request {}: {}",
                    request.id,
                    e
                );
                synced = false;
            }
        }

        // 2. Upsert the expertise record, pass or fail, so the latest
        //    attempt stays visible.
        let record = ExpertiseRecord {
            subject_id: request.subject_id,
            topic_id: request.topic_id,
            level: result.level,
            score: result.score,
            last_tested_at: completed_at,
        };
        if let Err(e) = self.expertise.upsert(&record).await {
            tracing::warn!(
                "Failed to upsert expertise for subject {} topic {}: {}",
                request.subject_id,
                request.topic_id,
                e
            );
            synced = false;
        }

        // 3. Notify the approver.
        if let Err(e) = self
            .notifications
            .notify_approver(request.topic_id, request.subject_id, result.score)
            .await
        {
            tracing::warn!("Failed to notify approver for request {}: {}", request.id, e);
            synced = false;
        }

        // 4. Grant XP on success, keyed so a replay never double-grants.
        if result.outcome == Outcome::Success {
            let idempotency_key = format!("{}:{}", request.subject_id, request.id);
            let reason = format!(
                "Mastery certified on topic {} ({}%)",
                request.topic_id, result.score
            );
            if let Err(e) = self
                .rewards
                .grant(request.subject_id, result.reward_xp, &idempotency_key, &reason)
                .await
            {
                tracing::warn!("Failed to grant XP for request {}: {}", request.id, e);
                synced = false;
            }
        }

        tracing::info!(
            "Request {} finalized: score={} level={} outcome={} synced={}",
            request.id,
            result.score,
            result.level,
            result.outcome.as_str(),
            synced
        );

        Ok(FinalizeSummary {
            request_id: request.id,
            score: result.score,
            level: result.level,
            outcome: result.outcome,
            reward_xp: result.reward_xp,
            synced,
        })
    }
}
