use async_trait::async_trait;
use chrono::{DateTime, Utc};
use internship_core_api::PrincipalRef;

use crate::error::StoreResult;
use crate::models::token::TokenModel;

/// Persistent registry of issued tokens keyed by opaque token id.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create(&self, item: TokenModel) -> StoreResult<TokenModel>;

    async fn find_by_id(&self, token_id: &str) -> StoreResult<Option<TokenModel>>;

    async fn touch(&self, token_id: &str, at: DateTime<Utc>) -> StoreResult<()>;

    /// Mark a token revoked regardless of its state
    ///
    /// # Returns
    /// * `Ok(true)` - The token exists (revoking twice is not an error)
    /// * `Ok(false)` - No token has this id
    async fn revoke(&self, token_id: &str) -> StoreResult<bool>;

    /// Revoke a token only while it is live at `now`
    ///
    /// The check and the write are one statement, so two concurrent callers
    /// cannot both observe `true`.
    async fn revoke_if_live(&self, token_id: &str, now: DateTime<Utc>) -> StoreResult<bool>;

    /// Revoke and expire every live token of a principal, optionally sparing one
    ///
    /// # Returns
    /// * Number of tokens affected
    async fn revoke_all(
        &self,
        principal: PrincipalRef,
        except: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<u64>;

    /// Delete tokens whose expiry is before `cutoff`
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}
