use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::token::TokenModel;

use super::repo_impl::TokenRepositoryImpl;

impl TokenRepositoryImpl {
    pub(super) async fn create_impl(&self, item: TokenModel) -> StoreResult<TokenModel> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;

        sqlx::query(
            r#"
            INSERT INTO access_tokens (token_id, token, tokenable_type, tokenable_id, purpose,
                abilities, device, issued_at, expires_at, last_used_at, revoked)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(item.token_id.as_str())
        .bind(&item.token_hash)
        .bind(item.principal.kind)
        .bind(item.principal.id)
        .bind(item.purpose)
        .bind(&item.abilities)
        .bind(item.device.as_deref())
        .bind(item.issued_at)
        .bind(item.expires_at)
        .bind(item.last_used_at)
        .bind(item.revoked)
        .execute(&mut **transaction)
        .await?;

        Ok(item)
    }
}
