use async_trait::async_trait;
use chrono::{DateTime, Utc};
use internship_core_api::PrincipalRef;
use internship_core_db::error::StoreResult;
use internship_core_db::models::token::TokenModel;
use internship_core_db::repository::token::TokenRepository;
use sqlx::{postgres::PgRow, Row};

use crate::executor::Executor;
use crate::utils::{get_heapless_string, get_principal, TryFromRow};

pub(super) const TOKEN_COLUMNS: &str = "token_id, token, tokenable_type, tokenable_id, purpose, abilities, \
     device, issued_at, expires_at, last_used_at, revoked";

pub struct TokenRepositoryImpl {
    pub executor: Executor,
}

impl TokenRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for TokenModel {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(TokenModel {
            token_id: get_heapless_string(row, "token_id")?,
            token_hash: row.try_get("token")?,
            principal: get_principal(row, "tokenable_type", "tokenable_id")?,
            purpose: row.try_get("purpose")?,
            abilities: row.try_get("abilities")?,
            device: row.try_get("device")?,
            issued_at: row.try_get("issued_at")?,
            expires_at: row.try_get("expires_at")?,
            last_used_at: row.try_get("last_used_at")?,
            revoked: row.try_get("revoked")?,
        })
    }
}

#[async_trait]
impl TokenRepository for TokenRepositoryImpl {
    async fn create(&self, item: TokenModel) -> StoreResult<TokenModel> {
        Self::create_impl(self, item).await
    }

    async fn find_by_id(&self, token_id: &str) -> StoreResult<Option<TokenModel>> {
        Self::find_by_id_impl(self, token_id).await
    }

    async fn touch(&self, token_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        Self::touch_impl(self, token_id, at).await
    }

    async fn revoke(&self, token_id: &str) -> StoreResult<bool> {
        Self::revoke_impl(self, token_id).await
    }

    async fn revoke_if_live(&self, token_id: &str, now: DateTime<Utc>) -> StoreResult<bool> {
        Self::revoke_if_live_impl(self, token_id, now).await
    }

    async fn revoke_all(
        &self,
        principal: PrincipalRef,
        except: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<u64> {
        Self::revoke_all_impl(self, principal, except, now).await
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        Self::delete_expired_before_impl(self, cutoff).await
    }
}
