use chrono::{DateTime, Utc};
use internship_core_api::PrincipalRef;
use internship_core_db::error::{StoreError, StoreResult};

use super::repo_impl::{table_of, PrincipalRepositoryImpl};

impl PrincipalRepositoryImpl {
    /// Runs `query` with `$1 = principal.id, $2 = at`; zero rows is `NotFound`.
    async fn execute_timestamp_update(
        &self,
        principal: PrincipalRef,
        query: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let rows_affected = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(query)
                .bind(principal.id)
                .bind(at)
                .execute(&mut **transaction)
                .await?
                .rows_affected()
        };
        if rows_affected == 0 {
            return Err(StoreError::not_found("principal", principal));
        }
        Ok(())
    }

    pub(super) async fn touch_last_login_impl(
        &self,
        principal: PrincipalRef,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let query = format!(
            "UPDATE {} SET last_login_at = $2 WHERE id = $1",
            table_of(principal.kind)
        );
        self.execute_timestamp_update(principal, &query, at).await
    }

    pub(super) async fn update_password_hash_impl(
        &self,
        principal: PrincipalRef,
        previous_hash: &str,
        new_hash: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let query = format!(
            "UPDATE {} SET password_hash = $2, updated_at = $3 WHERE id = $1 AND password_hash = $4",
            table_of(principal.kind)
        );
        let rows_affected = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(principal.id)
                .bind(new_hash)
                .bind(at)
                .bind(previous_hash)
                .execute(&mut **transaction)
                .await?
                .rows_affected()
        };
        if rows_affected == 0 {
            return Err(StoreError::conflict("principal", principal));
        }
        Ok(())
    }

    pub(super) async fn mark_email_verified_impl(
        &self,
        principal: PrincipalRef,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let query = format!(
            "UPDATE {} SET email_verified_at = $2, updated_at = $2 WHERE id = $1",
            table_of(principal.kind)
        );
        self.execute_timestamp_update(principal, &query, at).await
    }
}
