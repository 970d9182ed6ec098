use internship_core_api::PrincipalRef;
use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::tracker::{TrackerCount, TrackerFilter, TrackerModel};
use internship_core_db::repository::pagination::{Page, PageRequest};
use sqlx::Row;

use super::repo_impl::{TrackerRepositoryImpl, TRACKER_COLUMNS};
use crate::utils::TryFromRow;

const ORDER: &str = "ORDER BY due_date ASC NULLS LAST, id ASC";

impl TrackerRepositoryImpl {
    pub(super) async fn list_by_evaluator_impl(
        &self,
        evaluator: PrincipalRef,
        page: PageRequest,
    ) -> StoreResult<Page<TrackerModel>> {
        let predicate = "FROM evaluation_status_trackers WHERE evaluator_type = $1 AND evaluator_id = $2";
        let count_query = format!("SELECT COUNT(*) AS total {predicate}");
        let select_query =
            format!("SELECT {TRACKER_COLUMNS} {predicate} {ORDER} LIMIT $3 OFFSET $4");

        let (total, rows) = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            let total: i64 = sqlx::query(&count_query)
                .bind(evaluator.kind)
                .bind(evaluator.id)
                .fetch_one(&mut **transaction)
                .await?
                .try_get("total")?;
            let rows = sqlx::query(&select_query)
                .bind(evaluator.kind)
                .bind(evaluator.id)
                .bind(page.limit as i64)
                .bind(page.offset as i64)
                .fetch_all(&mut **transaction)
                .await?;
            (total, rows)
        };

        let items = rows
            .iter()
            .map(TrackerModel::try_from_row)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page::new(items, total as usize, page.limit, page.offset))
    }

    pub(super) async fn list_impl(
        &self,
        filter: TrackerFilter,
        page: PageRequest,
    ) -> StoreResult<Page<TrackerModel>> {
        let predicate = "FROM evaluation_status_trackers \
             WHERE ($1::tracker_kind IS NULL OR kind = $1) \
               AND ($2::tracker_status IS NULL OR status = $2)";
        let count_query = format!("SELECT COUNT(*) AS total {predicate}");
        let select_query =
            format!("SELECT {TRACKER_COLUMNS} {predicate} {ORDER} LIMIT $3 OFFSET $4");

        let (total, rows) = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            let total: i64 = sqlx::query(&count_query)
                .bind(filter.kind)
                .bind(filter.status)
                .fetch_one(&mut **transaction)
                .await?
                .try_get("total")?;
            let rows = sqlx::query(&select_query)
                .bind(filter.kind)
                .bind(filter.status)
                .bind(page.limit as i64)
                .bind(page.offset as i64)
                .fetch_all(&mut **transaction)
                .await?;
            (total, rows)
        };

        let items = rows
            .iter()
            .map(TrackerModel::try_from_row)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page::new(items, total as usize, page.limit, page.offset))
    }

    pub(super) async fn count_by_kind_and_status_impl(&self) -> StoreResult<Vec<TrackerCount>> {
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(
                r#"
                SELECT kind, status, COUNT(*) AS count
                FROM evaluation_status_trackers
                GROUP BY kind, status
                ORDER BY kind, status
                "#,
            )
            .fetch_all(&mut **transaction)
            .await?
        };
        rows.iter().map(TrackerCount::try_from_row).collect()
    }
}
