// src/state.rs

use std::sync::Arc;

use crate::coordinator::{CompletionOverlay, Coordinator};
use crate::lifecycle::LifecycleService;
use crate::sessions::SessionManager;
use crate::store::{ExpertiseStore, NotificationSink, ReferentLookup, RequestStore, RewardLedger};

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<LifecycleService>,
    pub sessions: SessionManager,
}

impl AppState {
    /// Wires the workflow core over a set of collaborator stores.
    /// Lifecycle and coordinator share one completion overlay, so reads
    /// through the lifecycle always see just-finished assessments.
    pub fn new(
        requests: Arc<dyn RequestStore>,
        expertise: Arc<dyn ExpertiseStore>,
        notifications: Arc<dyn NotificationSink>,
        rewards: Arc<dyn RewardLedger>,
        referents: Arc<dyn ReferentLookup>,
    ) -> Self {
        let overlay = Arc::new(CompletionOverlay::new());
        let coordinator = Arc::new(Coordinator::new(
            Arc::clone(&requests),
            expertise,
            notifications,
            rewards,
            Arc::clone(&overlay),
        ));
        let lifecycle = Arc::new(LifecycleService::new(requests, referents, overlay));
        let sessions = SessionManager::new(coordinator);

        Self {
            lifecycle,
            sessions,
        }
    }
}
