use chrono::{DateTime, Utc};
use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::token::TokenModel;

use super::repo_impl::{TokenRepositoryImpl, TOKEN_COLUMNS};
use crate::utils::TryFromRow;

impl TokenRepositoryImpl {
    pub(super) async fn find_by_id_impl(&self, token_id: &str) -> StoreResult<Option<TokenModel>> {
        let query = format!("SELECT {TOKEN_COLUMNS} FROM access_tokens WHERE token_id = $1");
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(token_id)
                .fetch_optional(&mut **transaction)
                .await?
        };
        row.as_ref().map(TokenModel::try_from_row).transpose()
    }

    pub(super) async fn touch_impl(&self, token_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        sqlx::query("UPDATE access_tokens SET last_used_at = $2 WHERE token_id = $1")
            .bind(token_id)
            .bind(at)
            .execute(&mut **transaction)
            .await?;
        Ok(())
    }
}
