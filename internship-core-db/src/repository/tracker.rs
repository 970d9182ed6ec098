use async_trait::async_trait;
use chrono::{DateTime, Utc};
use internship_core_api::{PrincipalRef, TrackerKind};

use crate::error::StoreResult;
use crate::models::tracker::{NewTracker, TrackerCount, TrackerFilter, TrackerModel};
use crate::repository::pagination::{Page, PageRequest};

/// Storage of evaluation trackers.
#[async_trait]
pub trait TrackerRepository: Send + Sync {
    /// Insert trackers in `pending` with no evaluator
    async fn create_batch(&self, items: Vec<NewTracker>) -> StoreResult<Vec<TrackerModel>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<TrackerModel>>;

    /// Trackers of a training ordered by kind
    async fn find_by_training(&self, training_id: i64) -> StoreResult<Vec<TrackerModel>>;

    async fn find_by_training_and_kind(
        &self,
        training_id: i64,
        kind: TrackerKind,
    ) -> StoreResult<Option<TrackerModel>>;

    /// Write `item` if the stored row still carries `item.version`
    ///
    /// # Returns
    /// * `Err(StoreError::Conflict)` - The version moved on
    async fn update(&self, item: &TrackerModel) -> StoreResult<TrackerModel>;

    /// Promote every tracker with `due_at < now` that is neither completed nor
    /// overdue to `overdue`
    ///
    /// # Returns
    /// * The promoted rows. Empty when nothing was due, so re-running is a no-op.
    async fn mark_overdue(&self, now: DateTime<Utc>) -> StoreResult<Vec<TrackerModel>>;

    /// Trackers assigned to `evaluator`, earliest due first
    async fn list_by_evaluator(
        &self,
        evaluator: PrincipalRef,
        page: PageRequest,
    ) -> StoreResult<Page<TrackerModel>>;

    /// Trackers ordered by `due_at` (unset last), then id
    async fn list(&self, filter: TrackerFilter, page: PageRequest) -> StoreResult<Page<TrackerModel>>;

    /// Non-zero counts per (kind, status)
    async fn count_by_kind_and_status(&self) -> StoreResult<Vec<TrackerCount>>;
}
