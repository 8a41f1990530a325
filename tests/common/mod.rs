// tests/common/mod.rs
//
// In-memory collaborator fakes for driving the workflow core without a
// database, plus a harness that wires them into an AppState.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use mastery_backend::error::AppError;
use mastery_backend::models::expertise::ExpertiseRecord;
use mastery_backend::models::request::{MasteryRequest, Outcome, RequestStatus};
use mastery_backend::state::AppState;
use mastery_backend::store::{
    ExpertiseStore, NotificationSink, ReferentLookup, RequestStore, RewardLedger,
};

#[derive(Default)]
pub struct InMemoryRequestStore {
    rows: Mutex<Vec<MasteryRequest>>,
    fail_updates: AtomicBool,
}

impl InMemoryRequestStore {
    /// Makes `update_outcome` fail, to exercise the best-effort paths.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub async fn snapshot(&self, id: Uuid) -> Option<MasteryRequest> {
        self.rows.lock().await.iter().find(|r| r.id == id).cloned()
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn create(&self, subject_id: Uuid, topic_id: Uuid) -> Result<MasteryRequest, AppError> {
        let request = MasteryRequest {
            id: Uuid::new_v4(),
            subject_id,
            topic_id,
            status: RequestStatus::Pending,
            outcome: None,
            score: None,
            answers: None,
            quiz_data: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.rows.lock().await.push(request.clone());
        Ok(request)
    }

    async fn get(&self, id: Uuid) -> Result<Option<MasteryRequest>, AppError> {
        Ok(self.rows.lock().await.iter().find(|r| r.id == id).cloned())
    }

    async fn latest_for(
        &self,
        subject_id: Uuid,
        topic_id: Uuid,
    ) -> Result<Option<MasteryRequest>, AppError> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|r| r.subject_id == subject_id && r.topic_id == topic_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn approve(
        &self,
        id: Uuid,
        quiz_data: Option<serde_json::Value>,
    ) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().await;
        let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        if row.status != RequestStatus::Pending {
            return Ok(false);
        }
        row.status = RequestStatus::Approved;
        if quiz_data.is_some() {
            row.quiz_data = quiz_data;
        }
        Ok(true)
    }

    async fn update_outcome(
        &self,
        id: Uuid,
        outcome: Outcome,
        score: i32,
        answers: &[i32],
        completed_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("injected update failure".to_string()));
        }
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;
        row.status = RequestStatus::Completed;
        row.outcome = Some(outcome);
        row.score = Some(score);
        row.answers = Some(answers.to_vec());
        row.completed_at = Some(completed_at);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryExpertiseStore {
    records: Mutex<HashMap<(Uuid, Uuid), ExpertiseRecord>>,
}

impl InMemoryExpertiseStore {
    pub async fn get(&self, subject_id: Uuid, topic_id: Uuid) -> Option<ExpertiseRecord> {
        self.records
            .lock()
            .await
            .get(&(subject_id, topic_id))
            .cloned()
    }
}

#[async_trait]
impl ExpertiseStore for InMemoryExpertiseStore {
    async fn upsert(&self, record: &ExpertiseRecord) -> Result<(), AppError> {
        self.records
            .lock()
            .await
            .insert((record.subject_id, record.topic_id), record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotificationSink {
    notes: Mutex<Vec<(Uuid, Uuid, i32)>>,
}

impl RecordingNotificationSink {
    pub async fn sent(&self) -> Vec<(Uuid, Uuid, i32)> {
        self.notes.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify_approver(
        &self,
        topic_id: Uuid,
        subject_id: Uuid,
        score: i32,
    ) -> Result<(), AppError> {
        self.notes.lock().await.push((topic_id, subject_id, score));
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRewardLedger {
    grants: Mutex<HashMap<String, i32>>,
    totals: Mutex<HashMap<Uuid, i32>>,
}

impl InMemoryRewardLedger {
    pub async fn total(&self, subject_id: Uuid) -> i32 {
        self.totals
            .lock()
            .await
            .get(&subject_id)
            .copied()
            .unwrap_or(0)
    }

    pub async fn grant_count(&self) -> usize {
        self.grants.lock().await.len()
    }
}

#[async_trait]
impl RewardLedger for InMemoryRewardLedger {
    async fn grant(
        &self,
        subject_id: Uuid,
        amount: i32,
        idempotency_key: &str,
        _reason: &str,
    ) -> Result<(), AppError> {
        let mut grants = self.grants.lock().await;
        if grants.contains_key(idempotency_key) {
            return Ok(());
        }
        grants.insert(idempotency_key.to_string(), amount);
        *self.totals.lock().await.entry(subject_id).or_insert(0) += amount;
        Ok(())
    }
}

#[derive(Default)]
pub struct StaticReferentLookup {
    assignments: Mutex<HashMap<Uuid, Uuid>>,
}

impl StaticReferentLookup {
    pub async fn assign(&self, topic_id: Uuid, subject_id: Uuid) {
        self.assignments.lock().await.insert(topic_id, subject_id);
    }
}

#[async_trait]
impl ReferentLookup for StaticReferentLookup {
    async fn assigned_expert(&self, topic_id: Uuid) -> Result<Option<Uuid>, AppError> {
        Ok(self.assignments.lock().await.get(&topic_id).copied())
    }
}

/// Everything a test needs: the wired state plus direct handles on the
/// fakes for assertions.
pub struct TestHarness {
    pub state: AppState,
    pub requests: Arc<InMemoryRequestStore>,
    pub expertise: Arc<InMemoryExpertiseStore>,
    pub notifications: Arc<RecordingNotificationSink>,
    pub rewards: Arc<InMemoryRewardLedger>,
    pub referents: Arc<StaticReferentLookup>,
}

pub fn harness() -> TestHarness {
    let requests = Arc::new(InMemoryRequestStore::default());
    let expertise = Arc::new(InMemoryExpertiseStore::default());
    let notifications = Arc::new(RecordingNotificationSink::default());
    let rewards = Arc::new(InMemoryRewardLedger::default());
    let referents = Arc::new(StaticReferentLookup::default());

    let state = AppState::new(
        requests.clone(),
        expertise.clone(),
        notifications.clone(),
        rewards.clone(),
        referents.clone(),
    );

    TestHarness {
        state,
        requests,
        expertise,
        notifications,
        rewards,
        referents,
    }
}

/// Quiz payload in the wrapper shape, one question per correct index.
pub fn quiz(correct: &[i32]) -> serde_json::Value {
    let questions: Vec<serde_json::Value> = correct
        .iter()
        .enumerate()
        .map(|(i, c)| {
            serde_json::json!({
                "q": format!("Question {}", i + 1),
                "options": ["a", "b", "c", "d"],
                "correct": c,
            })
        })
        .collect();
    serde_json::json!({ "questions": questions })
}
