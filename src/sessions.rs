// src/sessions.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use uuid::Uuid;

use crate::assessment::{AssessmentSession, Progress};
use crate::config::{NO_ANSWER, OPTION_COUNT};
use crate::coordinator::{Coordinator, FinalizeSummary};
use crate::error::AppError;
use crate::models::question::PublicQuestion;
use crate::models::request::{MasteryRequest, RequestStatus};
use crate::models::session::SessionView;
use crate::normalizer::normalize_quiz;

/// A running session plus its countdown task.
struct ActiveSession {
    session: AssessmentSession,
    request: MasteryRequest,

    /// The one live timer for this session. Aborted and replaced whenever
    /// the question index advances by a learner answer; aborted outright on
    /// abandonment.
    timer: Option<JoinHandle<()>>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// What an answer submission led to.
pub enum AnswerOutcome {
    InProgress(SessionView),
    Finished(FinalizeSummary),
}

/// Owns all live assessment sessions: at most one per request id, each with
/// a single cooperative countdown. Finished sessions are handed to the
/// coordinator exactly once; abandoned sessions leave no trace.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<Uuid, ActiveSession>>>,
    coordinator: Arc<Coordinator>,
}

impl SessionManager {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            coordinator,
        }
    }

    /// Starts the assessment session for an approved request.
    pub async fn start(&self, request: MasteryRequest) -> Result<SessionView, AppError> {
        if request.status != RequestStatus::Approved {
            return Err(AppError::Conflict(format!(
                "Request {} is {}, the exam is not available",
                request.id,
                request.status.as_str()
            )));
        }

        let quiz_data = request.quiz_data.clone().ok_or_else(|| {
            AppError::Validation(format!("Request {} has no quiz attached", request.id))
        })?;
        let questions = normalize_quiz(&quiz_data);
        if questions.is_empty() {
            return Err(AppError::Validation(
                "Assessment payload contains no questions".to_string(),
            ));
        }

        let request_id = request.id;
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&request_id) {
            return Err(AppError::Conflict(format!(
                "An assessment session is already running for request {}",
                request_id
            )));
        }

        let session = AssessmentSession::new(questions);
        let view = view_of(request_id, &session);
        sessions.insert(
            request_id,
            ActiveSession {
                session,
                request,
                timer: Some(self.spawn_timer(request_id)),
            },
        );

        tracing::info!(
            "Assessment started for request {} ({} questions)",
            request_id,
            view.total_questions
        );
        Ok(view)
    }

    /// Current question and countdown for a live session.
    pub async fn view(&self, request_id: Uuid) -> Result<SessionView, AppError> {
        let sessions = self.sessions.lock().await;
        let entry = sessions
            .get(&request_id)
            .ok_or_else(|| AppError::NotFound(format!("No active session for {}", request_id)))?;
        Ok(view_of(request_id, &entry.session))
    }

    /// Records the learner's answer for the current question.
    pub async fn answer(&self, request_id: Uuid, choice: i32) -> Result<AnswerOutcome, AppError> {
        if choice < 0 || choice >= OPTION_COUNT as i32 {
            return Err(AppError::Validation(format!(
                "Answer choice {} is out of range",
                choice
            )));
        }

        let (request, result) = {
            let mut sessions = self.sessions.lock().await;
            let entry = sessions.get_mut(&request_id).ok_or_else(|| {
                AppError::NotFound(format!("No active session for {}", request_id))
            })?;

            // The running countdown belongs to the question being answered.
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }

            match entry.session.submit_answer(choice) {
                Progress::Next(_) => {
                    entry.timer = Some(self.spawn_timer(request_id));
                    return Ok(AnswerOutcome::InProgress(view_of(
                        request_id,
                        &entry.session,
                    )));
                }
                Progress::Finished(result) => {
                    let request = entry.request.clone();
                    sessions.remove(&request_id);
                    (request, result)
                }
            }
        };
        let summary = self.coordinator.finalize(&request, &result).await?;
        Ok(AnswerOutcome::Finished(summary))
    }

    /// Discards a session before completion. Cancels the timer, never
    /// touches the request or the coordinator. Idempotent.
    pub async fn abandon(&self, request_id: Uuid) {
        let removed = self.sessions.lock().await.remove(&request_id);
        match removed {
            Some(_) => tracing::info!("Assessment session {} abandoned", request_id),
            None => tracing::debug!("No session to abandon for {}", request_id),
        }
    }

    /// One countdown task per session: ticks once per second, and at zero
    /// submits the sentinel answer on the learner's behalf.
    fn spawn_timer(&self, request_id: Uuid) -> JoinHandle<()> {
        let sessions = Arc::clone(&self.sessions);
        let coordinator = Arc::clone(&self.coordinator);

        tokio::spawn(async move {
            loop {
                sleep(Duration::from_secs(1)).await;

                let finished = {
                    let mut sessions = sessions.lock().await;
                    let Some(entry) = sessions.get_mut(&request_id) else {
                        // Session answered away or abandoned; nothing to do.
                        return;
                    };
                    if entry.session.tick() > 0 {
                        continue;
                    }

                    tracing::info!(
                        "Question {} timed out for request {}, recording no-answer",
                        entry.session.current_index(),
                        request_id
                    );
                    match entry.session.submit_answer(NO_ANSWER) {
                        // Timer for the next question is this same loop; the
                        // countdown was reset by the advance.
                        Progress::Next(_) => None,
                        Progress::Finished(result) => {
                            let request = entry.request.clone();
                            if let Some(mut finished) = sessions.remove(&request_id) {
                                // This task holds its own handle; detach it
                                // instead of letting Drop abort us mid-finalize.
                                finished.timer.take();
                            }
                            Some((request, result))
                        }
                    }
                };

                if let Some((request, result)) = finished {
                    match coordinator.finalize(&request, &result).await {
                        Ok(summary) => tracing::info!(
                            "Request {} finalized after timeout: score={}",
                            request_id,
                            summary.score
                        ),
                        Err(AppError::DuplicateSubmission(_)) => {
                            tracing::debug!("Request {} already finalized", request_id)
                        }
                        Err(e) => {
                            tracing::warn!("Finalize after timeout failed for {}: {}", request_id, e)
                        }
                    }
                    return;
                }
            }
        })
    }
}

fn view_of(request_id: Uuid, session: &AssessmentSession) -> SessionView {
    SessionView {
        request_id,
        question_index: session.current_index(),
        total_questions: session.total_questions(),
        remaining_seconds: session.remaining_seconds(),
        question: PublicQuestion::from(session.current_question()),
    }
}
