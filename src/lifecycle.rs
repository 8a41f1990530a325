// src/lifecycle.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::RETRY_COOLDOWN_DAYS;
use crate::coordinator::CompletionOverlay;
use crate::error::AppError;
use crate::models::request::MasteryRequest;
use crate::store::{ReferentLookup, RequestStore};

/// Presentation state derived from the latest request for a pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MasteryStatus {
    NotStarted,
    AwaitingApproval,
    ExamAvailable,
    /// Terminal: no further action for this pair.
    Certified { score: i32 },
    Cooldown { retry_at: DateTime<Utc> },
    RetryAvailable,
}

/// Cooldown window of a failed request.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RetryEligibility {
    pub retry_at: DateTime<Utc>,
    pub eligible: bool,
}

/// Retry window for a completed+fail request; `None` for anything else.
/// Eligible exactly at `completed_at + RETRY_COOLDOWN_DAYS`, not before.
pub fn retry_eligibility(request: &MasteryRequest, now: DateTime<Utc>) -> Option<RetryEligibility> {
    if !request.is_failed() {
        return None;
    }
    let retry_at = request.completed_at? + Duration::days(RETRY_COOLDOWN_DAYS);
    Some(RetryEligibility {
        retry_at,
        eligible: now >= retry_at,
    })
}

/// Derives the presentation state from the latest request, if any.
pub fn derive_status(latest: Option<&MasteryRequest>, now: DateTime<Utc>) -> MasteryStatus {
    let Some(request) = latest else {
        return MasteryStatus::NotStarted;
    };

    if request.is_terminal_success() {
        return MasteryStatus::Certified {
            score: request.score.unwrap_or(0),
        };
    }
    if request.is_failed() {
        return match retry_eligibility(request, now) {
            Some(window) if !window.eligible => MasteryStatus::Cooldown {
                retry_at: window.retry_at,
            },
            _ => MasteryStatus::RetryAvailable,
        };
    }
    match request.status {
        crate::models::request::RequestStatus::Pending => MasteryStatus::AwaitingApproval,
        _ => MasteryStatus::ExamAvailable,
    }
}

/// Owns the persistent request state machine: creation with conflict rules,
/// approval, and status derivation. All reads go through the coordinator's
/// completion overlay.
pub struct LifecycleService {
    requests: Arc<dyn RequestStore>,
    referents: Arc<dyn ReferentLookup>,
    overlay: Arc<CompletionOverlay>,
}

impl LifecycleService {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        referents: Arc<dyn ReferentLookup>,
        overlay: Arc<CompletionOverlay>,
    ) -> Self {
        Self {
            requests,
            referents,
            overlay,
        }
    }

    /// Creates a new `pending` certification request for the pair.
    ///
    /// Conflicts: the topic already has another assigned referent; the pair
    /// holds a terminal success; an attempt cycle is still underway; or the
    /// last attempt failed and the cooldown has not elapsed.
    pub async fn request_certification(
        &self,
        subject_id: Uuid,
        topic_id: Uuid,
    ) -> Result<MasteryRequest, AppError> {
        if let Some(expert) = self.referents.assigned_expert(topic_id).await? {
            if expert != subject_id {
                return Err(AppError::Conflict(
                    "Topic already has an assigned referent".to_string(),
                ));
            }
        }

        let latest = self.requests.latest_for(subject_id, topic_id).await?;
        let latest = self.overlay.apply(latest).await;

        if let Some(previous) = latest {
            if previous.is_terminal_success() {
                return Err(AppError::Conflict(
                    "Subject is already certified on this topic".to_string(),
                ));
            }
            if previous.is_active() {
                return Err(AppError::Conflict(
                    "A certification request is already in progress for this topic".to_string(),
                ));
            }
            if let Some(window) = retry_eligibility(&previous, Utc::now()) {
                if !window.eligible {
                    return Err(AppError::Conflict(format!(
                        "Retry available on {}",
                        window.retry_at.format("%Y-%m-%d")
                    )));
                }
            }
        }

        let request = self.requests.create(subject_id, topic_id).await?;
        tracing::info!(
            "Certification requested: request={} subject={} topic={}",
            request.id,
            subject_id,
            topic_id
        );
        Ok(request)
    }

    /// Approves a pending request, attaching the quiz payload generated for
    /// the learner. Approving a non-pending request is a silent no-op.
    pub async fn approve(
        &self,
        request_id: Uuid,
        quiz_data: Option<serde_json::Value>,
    ) -> Result<(), AppError> {
        let approved = self.requests.approve(request_id, quiz_data).await?;
        if approved {
            tracing::info!("Request {} approved", request_id);
        } else {
            tracing::warn!("Request {} is not pending, ignoring approval", request_id);
        }
        Ok(())
    }

    pub async fn get_request(&self, request_id: Uuid) -> Result<MasteryRequest, AppError> {
        let fetched = self.requests.get(request_id).await?;
        self.overlay
            .apply(fetched)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", request_id)))
    }

    /// Presentation state for the pair, from the latest (overlaid) request.
    pub async fn status_for(
        &self,
        subject_id: Uuid,
        topic_id: Uuid,
    ) -> Result<MasteryStatus, AppError> {
        let latest = self.requests.latest_for(subject_id, topic_id).await?;
        let latest = self.overlay.apply(latest).await;
        Ok(derive_status(latest.as_ref(), Utc::now()))
    }
}
