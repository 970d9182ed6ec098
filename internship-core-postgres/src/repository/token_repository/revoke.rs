use chrono::{DateTime, Utc};
use internship_core_api::PrincipalRef;
use internship_core_db::error::{StoreError, StoreResult};

use super::repo_impl::TokenRepositoryImpl;

impl TokenRepositoryImpl {
    pub(super) async fn revoke_impl(&self, token_id: &str) -> StoreResult<bool> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        let rows_affected = sqlx::query("UPDATE access_tokens SET revoked = TRUE WHERE token_id = $1")
            .bind(token_id)
            .execute(&mut **transaction)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }

    pub(super) async fn revoke_if_live_impl(
        &self,
        token_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        let rows_affected = sqlx::query(
            r#"
            UPDATE access_tokens SET revoked = TRUE
            WHERE token_id = $1 AND revoked = FALSE AND expires_at > $2
            "#,
        )
        .bind(token_id)
        .bind(now)
        .execute(&mut **transaction)
        .await?
        .rows_affected();
        Ok(rows_affected == 1)
    }

    pub(super) async fn revoke_all_impl(
        &self,
        principal: PrincipalRef,
        except: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        let rows_affected = sqlx::query(
            r#"
            UPDATE access_tokens SET revoked = TRUE, expires_at = $3
            WHERE tokenable_type = $1 AND tokenable_id = $2
              AND revoked = FALSE AND expires_at > $3
              AND ($4::TEXT IS NULL OR token_id <> $4)
            "#,
        )
        .bind(principal.kind)
        .bind(principal.id)
        .bind(now)
        .bind(except)
        .execute(&mut **transaction)
        .await?
        .rows_affected();
        Ok(rows_affected)
    }
}
