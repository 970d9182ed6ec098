use std::sync::Arc;
use std::time::Duration;

use internship_core_api::CoreResult;
use internship_core_db::repository::Store;
use internship_core_service::{
    ApprovalEngine, AuthService, AuthSettings, Clock, Courier, EvaluationTracker, SweepSettings,
    Sweeper,
};

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: Arc<AuthService>,
    pub approvals: Arc<ApprovalEngine>,
    pub evaluations: Arc<EvaluationTracker>,
    pub sweeper: Arc<Sweeper>,
    pub request_timeout: Duration,
    /// Take the client address from `X-Forwarded-For` instead of the socket peer.
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        auth: AuthSettings,
        sweeps: SweepSettings,
        request_timeout: Duration,
        courier: Arc<dyn Courier>,
    ) -> CoreResult<Self> {
        let evaluations = Arc::new(EvaluationTracker::new(store.clone(), clock.clone()));
        Ok(Self {
            auth: Arc::new(
                AuthService::new(store.clone(), clock.clone(), auth)?.with_courier(courier),
            ),
            approvals: Arc::new(ApprovalEngine::new(store.clone(), clock.clone())),
            sweeper: Arc::new(Sweeper::new(store.clone(), clock, evaluations.clone(), sweeps)),
            evaluations,
            store,
            request_timeout,
            trust_forwarded_for: false,
        })
    }

    pub fn with_trusted_proxy(mut self, trust_forwarded_for: bool) -> Self {
        self.trust_forwarded_for = trust_forwarded_for;
        self
    }
}
