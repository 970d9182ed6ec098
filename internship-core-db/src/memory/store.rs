use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::StoreResult;
use crate::models::{
    ApprovalModel, ApprovalTransitionModel, AuditEntryModel, EnrollmentModel, NotificationModel,
    StudentModel, SuperAdminModel, TokenModel, TrackerModel, TrainingModel,
};
use crate::repository::{
    ApprovalRepository, AuditRepository, EnrollmentRepository, NotificationRepository, PoolStats,
    PrincipalRepository, Store, TokenRepository, TrackerRepository, TrainingRepository, UnitOfWork,
};

/// Complete store contents. Fields are public so tests can seed rows with fixed ids.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub students: BTreeMap<i64, StudentModel>,
    pub super_admins: BTreeMap<i64, SuperAdminModel>,
    pub tokens: HashMap<String, TokenModel>,
    pub enrollments: BTreeMap<i64, EnrollmentModel>,
    pub approvals: BTreeMap<i64, ApprovalModel>,
    pub transitions: Vec<ApprovalTransitionModel>,
    pub trainings: BTreeMap<i64, TrainingModel>,
    pub trackers: BTreeMap<i64, TrackerModel>,
    pub audit: Vec<AuditEntryModel>,
    pub notifications: Vec<NotificationModel>,
}

pub(super) fn next_id<V>(rows: &BTreeMap<i64, V>) -> i64 {
    rows.keys().next_back().map_or(1, |id| id + 1)
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the committed state, outside any unit of work.
    pub async fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut state = self.state.lock().await;
        f(&mut state)
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let committed = self.state.clone().lock_owned().await;
        let working = parking_lot::Mutex::new(committed.clone());
        Ok(Box::new(MemoryUnitOfWork { committed, working }))
    }

    async fn health(&self, _timeout: Duration) -> StoreResult<Duration> {
        Ok(Duration::ZERO)
    }

    fn stats(&self) -> PoolStats {
        let idle = u32::from(self.state.try_lock().is_ok());
        PoolStats {
            max_open: 1,
            open: 1,
            idle,
            in_use: 1 - idle,
        }
    }
}

pub struct MemoryUnitOfWork {
    committed: OwnedMutexGuard<MemoryState>,
    pub(super) working: parking_lot::Mutex<MemoryState>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn principals(&self) -> &dyn PrincipalRepository {
        self
    }

    fn tokens(&self) -> &dyn TokenRepository {
        self
    }

    fn enrollments(&self) -> &dyn EnrollmentRepository {
        self
    }

    fn approvals(&self) -> &dyn ApprovalRepository {
        self
    }

    fn trainings(&self) -> &dyn TrainingRepository {
        self
    }

    fn trackers(&self) -> &dyn TrackerRepository {
        self
    }

    fn audit(&self) -> &dyn AuditRepository {
        self
    }

    fn notifications(&self) -> &dyn NotificationRepository {
        self
    }

    async fn try_advisory_lock(&self, _key: i64) -> StoreResult<bool> {
        // Units already exclude each other.
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryUnitOfWork {
            mut committed,
            working,
        } = *self;
        *committed = working.into_inner();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
