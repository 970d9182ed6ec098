use chrono::{DateTime, Utc};
use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::tracker::TrackerModel;

use super::repo_impl::{TrackerRepositoryImpl, TRACKER_COLUMNS};
use crate::utils::TryFromRow;

impl TrackerRepositoryImpl {
    pub(super) async fn update_impl(&self, item: &TrackerModel) -> StoreResult<TrackerModel> {
        let query = format!(
            r#"
            UPDATE evaluation_status_trackers SET
                evaluator_type = $2, evaluator_id = $3, due_date = $4, status = $5,
                remarks = $6, assigned_at = $7, completed_at = $8, updated_at = $9,
                version = version + 1
            WHERE id = $1 AND version = $10
            RETURNING {TRACKER_COLUMNS}
            "#
        );
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(item.id)
                .bind(item.evaluator.map(|evaluator| evaluator.kind))
                .bind(item.evaluator.map(|evaluator| evaluator.id))
                .bind(item.due_at)
                .bind(item.status)
                .bind(item.remarks.as_deref())
                .bind(item.assigned_at)
                .bind(item.completed_at)
                .bind(item.updated_at)
                .bind(item.version)
                .fetch_optional(&mut **transaction)
                .await?
        };

        match row {
            Some(row) => TrackerModel::try_from_row(&row),
            None => Err(StoreError::conflict("tracker", item.id)),
        }
    }

    pub(super) async fn mark_overdue_impl(&self, now: DateTime<Utc>) -> StoreResult<Vec<TrackerModel>> {
        let query = format!(
            r#"
            UPDATE evaluation_status_trackers SET
                status = 'overdue', updated_at = $1, version = version + 1
            WHERE due_date < $1 AND status IN ('pending', 'in_progress')
            RETURNING {TRACKER_COLUMNS}
            "#
        );
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(now)
                .fetch_all(&mut **transaction)
                .await?
        };

        let mut promoted = rows
            .iter()
            .map(TrackerModel::try_from_row)
            .collect::<StoreResult<Vec<_>>>()?;
        promoted.sort_by_key(|tracker| tracker.id);
        Ok(promoted)
    }
}
