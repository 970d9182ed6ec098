use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::error::StoreResult;
use crate::repository::{
    ApprovalRepository, AuditRepository, EnrollmentRepository, NotificationRepository,
    PrincipalRepository, TokenRepository, TrackerRepository, TrainingRepository,
};

/// Connection pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub max_open: u32,
    pub open: u32,
    pub idle: u32,
    pub in_use: u32,
}

/// Transactional entry point of the persistence gateway.
///
/// Services never hold a connection outside a [`UnitOfWork`]; every read and
/// write goes through one, and nothing is visible to other units until
/// [`UnitOfWork::commit`]. Dropping a unit without committing rolls it back.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new transaction
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;

    /// Time-bounded ping
    ///
    /// # Returns
    /// * `Ok(Duration)` - Round-trip latency
    /// * `Err(StoreError::Unavailable)` - The store did not answer within `timeout`
    async fn health(&self, timeout: Duration) -> StoreResult<Duration>;

    fn stats(&self) -> PoolStats;
}

/// One transaction with access to every repository.
///
/// All repositories returned by a unit share its transaction.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn principals(&self) -> &dyn PrincipalRepository;
    fn tokens(&self) -> &dyn TokenRepository;
    fn enrollments(&self) -> &dyn EnrollmentRepository;
    fn approvals(&self) -> &dyn ApprovalRepository;
    fn trainings(&self) -> &dyn TrainingRepository;
    fn trackers(&self) -> &dyn TrackerRepository;
    fn audit(&self) -> &dyn AuditRepository;
    fn notifications(&self) -> &dyn NotificationRepository;

    /// Try to take a transaction-scoped advisory lock; released on commit or rollback
    ///
    /// # Returns
    /// * `Ok(false)` - Another instance holds the lock
    async fn try_advisory_lock(&self, key: i64) -> StoreResult<bool>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
