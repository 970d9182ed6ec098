//! A [`Store`] over the memory store that misbehaves in one chosen way.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use internship_core_api::{PrincipalRef, TrackerKind};
use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::memory::MemoryStore;
use internship_core_db::models::{
    ApprovalFilter, ApprovalModel, ApprovalTransitionModel, NewApproval, NewApprovalTransition,
    NewTracker, TrackerCount, TrackerFilter, TrackerModel,
};
use internship_core_db::repository::{
    ApprovalRepository, AuditRepository, EnrollmentRepository, NotificationRepository, Page,
    PageRequest, PoolStats, PrincipalRepository, Store, TokenRepository, TrackerRepository,
    TrainingRepository, UnitOfWork,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Commit is refused; the unit rolls back.
    FailCommit,
    /// Commit never returns.
    StallCommit,
    /// Another writer bumps every approval and tracker between read and write.
    StaleVersion,
}

pub struct FaultyStore {
    inner: MemoryStore,
    fault: Fault,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore, fault: Fault) -> Self {
        Self { inner, fault }
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FaultyUnitOfWork {
            inner,
            fault: self.fault,
        }))
    }

    async fn health(&self, timeout: Duration) -> StoreResult<Duration> {
        self.inner.health(timeout).await
    }

    fn stats(&self) -> PoolStats {
        self.inner.stats()
    }
}

struct FaultyUnitOfWork {
    inner: Box<dyn UnitOfWork>,
    fault: Fault,
}

impl FaultyUnitOfWork {
    fn stale(&self) -> bool {
        self.fault == Fault::StaleVersion
    }
}

#[async_trait]
impl UnitOfWork for FaultyUnitOfWork {
    fn principals(&self) -> &dyn PrincipalRepository {
        self.inner.principals()
    }

    fn tokens(&self) -> &dyn TokenRepository {
        self.inner.tokens()
    }

    fn enrollments(&self) -> &dyn EnrollmentRepository {
        self.inner.enrollments()
    }

    fn approvals(&self) -> &dyn ApprovalRepository {
        if self.stale() {
            return self;
        }
        self.inner.approvals()
    }

    fn trainings(&self) -> &dyn TrainingRepository {
        self.inner.trainings()
    }

    fn trackers(&self) -> &dyn TrackerRepository {
        if self.stale() {
            return self;
        }
        self.inner.trackers()
    }

    fn audit(&self) -> &dyn AuditRepository {
        self.inner.audit()
    }

    fn notifications(&self) -> &dyn NotificationRepository {
        self.inner.notifications()
    }

    async fn try_advisory_lock(&self, key: i64) -> StoreResult<bool> {
        self.inner.try_advisory_lock(key).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        match self.fault {
            Fault::FailCommit => {
                self.inner.rollback().await?;
                Err(StoreError::Unavailable("connection reset during commit".to_string()))
            }
            Fault::StallCommit => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                self.inner.commit().await
            }
            Fault::StaleVersion => self.inner.commit().await,
        }
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.inner.rollback().await
    }
}

// Only reachable under `Fault::StaleVersion`: writes carry a version one behind.
#[async_trait]
impl ApprovalRepository for FaultyUnitOfWork {
    async fn create(&self, item: NewApproval) -> StoreResult<ApprovalModel> {
        self.inner.approvals().create(item).await
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<ApprovalModel>> {
        self.inner.approvals().find_by_id(id).await
    }

    async fn find_by_enrollment(&self, student_enroll_id: i64) -> StoreResult<Option<ApprovalModel>> {
        self.inner.approvals().find_by_enrollment(student_enroll_id).await
    }

    async fn update(&self, item: &ApprovalModel) -> StoreResult<ApprovalModel> {
        let mut behind = item.clone();
        behind.version -= 1;
        self.inner.approvals().update(&behind).await
    }

    async fn list(&self, filter: ApprovalFilter, page: PageRequest) -> StoreResult<Page<ApprovalModel>> {
        self.inner.approvals().list(filter, page).await
    }

    async fn append_transition(
        &self,
        item: NewApprovalTransition,
    ) -> StoreResult<ApprovalTransitionModel> {
        self.inner.approvals().append_transition(item).await
    }

    async fn history(&self, approval_id: i64) -> StoreResult<Vec<ApprovalTransitionModel>> {
        self.inner.approvals().history(approval_id).await
    }
}

#[async_trait]
impl TrackerRepository for FaultyUnitOfWork {
    async fn create_batch(&self, items: Vec<NewTracker>) -> StoreResult<Vec<TrackerModel>> {
        self.inner.trackers().create_batch(items).await
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<TrackerModel>> {
        self.inner.trackers().find_by_id(id).await
    }

    async fn find_by_training(&self, training_id: i64) -> StoreResult<Vec<TrackerModel>> {
        self.inner.trackers().find_by_training(training_id).await
    }

    async fn find_by_training_and_kind(
        &self,
        training_id: i64,
        kind: TrackerKind,
    ) -> StoreResult<Option<TrackerModel>> {
        self.inner.trackers().find_by_training_and_kind(training_id, kind).await
    }

    async fn update(&self, item: &TrackerModel) -> StoreResult<TrackerModel> {
        let mut behind = item.clone();
        behind.version -= 1;
        self.inner.trackers().update(&behind).await
    }

    async fn mark_overdue(&self, now: DateTime<Utc>) -> StoreResult<Vec<TrackerModel>> {
        self.inner.trackers().mark_overdue(now).await
    }

    async fn list_by_evaluator(
        &self,
        evaluator: PrincipalRef,
        page: PageRequest,
    ) -> StoreResult<Page<TrackerModel>> {
        self.inner.trackers().list_by_evaluator(evaluator, page).await
    }

    async fn list(&self, filter: TrackerFilter, page: PageRequest) -> StoreResult<Page<TrackerModel>> {
        self.inner.trackers().list(filter, page).await
    }

    async fn count_by_kind_and_status(&self) -> StoreResult<Vec<TrackerCount>> {
        self.inner.trackers().count_by_kind_and_status().await
    }
}
