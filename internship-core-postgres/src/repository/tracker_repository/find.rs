use internship_core_api::TrackerKind;
use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::tracker::TrackerModel;

use super::repo_impl::{TrackerRepositoryImpl, TRACKER_COLUMNS};
use crate::utils::TryFromRow;

impl TrackerRepositoryImpl {
    pub(super) async fn find_by_id_impl(&self, id: i64) -> StoreResult<Option<TrackerModel>> {
        let query = format!("SELECT {TRACKER_COLUMNS} FROM evaluation_status_trackers WHERE id = $1");
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(id)
                .fetch_optional(&mut **transaction)
                .await?
        };
        row.as_ref().map(TrackerModel::try_from_row).transpose()
    }

    pub(super) async fn find_by_training_impl(&self, training_id: i64) -> StoreResult<Vec<TrackerModel>> {
        // Enum order in the schema matches TrackerKind's declaration order.
        let query = format!(
            "SELECT {TRACKER_COLUMNS} FROM evaluation_status_trackers WHERE training_id = $1 ORDER BY kind"
        );
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(training_id)
                .fetch_all(&mut **transaction)
                .await?
        };
        rows.iter().map(TrackerModel::try_from_row).collect()
    }

    pub(super) async fn find_by_training_and_kind_impl(
        &self,
        training_id: i64,
        kind: TrackerKind,
    ) -> StoreResult<Option<TrackerModel>> {
        let query = format!(
            "SELECT {TRACKER_COLUMNS} FROM evaluation_status_trackers WHERE training_id = $1 AND kind = $2"
        );
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(training_id)
                .bind(kind)
                .fetch_optional(&mut **transaction)
                .await?
        };
        row.as_ref().map(TrackerModel::try_from_row).transpose()
    }
}
