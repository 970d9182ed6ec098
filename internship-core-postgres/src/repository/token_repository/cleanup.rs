use chrono::{DateTime, Utc};
use internship_core_db::error::{StoreError, StoreResult};

use super::repo_impl::TokenRepositoryImpl;

impl TokenRepositoryImpl {
    pub(super) async fn delete_expired_before_impl(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        let rows_affected = sqlx::query("DELETE FROM access_tokens WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&mut **transaction)
            .await?
            .rows_affected();
        Ok(rows_affected)
    }
}
