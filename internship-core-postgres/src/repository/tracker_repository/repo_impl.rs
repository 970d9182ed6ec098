use async_trait::async_trait;
use chrono::{DateTime, Utc};
use internship_core_api::{PrincipalRef, TrackerKind};
use internship_core_db::error::StoreResult;
use internship_core_db::models::tracker::{NewTracker, TrackerCount, TrackerFilter, TrackerModel};
use internship_core_db::repository::pagination::{Page, PageRequest};
use internship_core_db::repository::tracker::TrackerRepository;
use sqlx::{postgres::PgRow, Row};

use crate::executor::Executor;
use crate::utils::{get_optional_principal, TryFromRow};

pub(super) const TRACKER_COLUMNS: &str = "id, training_id, kind, evaluator_type, evaluator_id, \
     due_date, status, remarks, assigned_at, completed_at, version, created_at, updated_at";

pub struct TrackerRepositoryImpl {
    pub executor: Executor,
}

impl TrackerRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for TrackerModel {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(TrackerModel {
            id: row.try_get("id")?,
            training_id: row.try_get("training_id")?,
            kind: row.try_get("kind")?,
            evaluator: get_optional_principal(row, "evaluator_type", "evaluator_id")?,
            due_at: row.try_get("due_date")?,
            status: row.try_get("status")?,
            remarks: row.try_get("remarks")?,
            assigned_at: row.try_get("assigned_at")?,
            completed_at: row.try_get("completed_at")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFromRow<PgRow> for TrackerCount {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(TrackerCount {
            kind: row.try_get("kind")?,
            status: row.try_get("status")?,
            count: row.try_get("count")?,
        })
    }
}

#[async_trait]
impl TrackerRepository for TrackerRepositoryImpl {
    async fn create_batch(&self, items: Vec<NewTracker>) -> StoreResult<Vec<TrackerModel>> {
        Self::create_batch_impl(self, items).await
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<TrackerModel>> {
        Self::find_by_id_impl(self, id).await
    }

    async fn find_by_training(&self, training_id: i64) -> StoreResult<Vec<TrackerModel>> {
        Self::find_by_training_impl(self, training_id).await
    }

    async fn find_by_training_and_kind(
        &self,
        training_id: i64,
        kind: TrackerKind,
    ) -> StoreResult<Option<TrackerModel>> {
        Self::find_by_training_and_kind_impl(self, training_id, kind).await
    }

    async fn update(&self, item: &TrackerModel) -> StoreResult<TrackerModel> {
        Self::update_impl(self, item).await
    }

    async fn mark_overdue(&self, now: DateTime<Utc>) -> StoreResult<Vec<TrackerModel>> {
        Self::mark_overdue_impl(self, now).await
    }

    async fn list_by_evaluator(
        &self,
        evaluator: PrincipalRef,
        page: PageRequest,
    ) -> StoreResult<Page<TrackerModel>> {
        Self::list_by_evaluator_impl(self, evaluator, page).await
    }

    async fn list(&self, filter: TrackerFilter, page: PageRequest) -> StoreResult<Page<TrackerModel>> {
        Self::list_impl(self, filter, page).await
    }

    async fn count_by_kind_and_status(&self) -> StoreResult<Vec<TrackerCount>> {
        Self::count_by_kind_and_status_impl(self).await
    }
}
