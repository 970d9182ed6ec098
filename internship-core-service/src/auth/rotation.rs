use internship_core_api::{
    AuditAction, AuditSubject, CoreError, CoreResult, PrincipalRef, SubjectKind, TokenPurpose,
};
use serde_json::json;
use tracing::{debug, info, instrument};

use super::service::AuthService;
use super::session::{LoginResult, Session};
use crate::audit::AuditEvent;
use crate::context::RequestContext;

impl AuthService {
    /// Resolve an access bearer into a session and stamp its last use.
    #[instrument(skip_all)]
    pub async fn verify(&self, ctx: &RequestContext, bearer: &str) -> CoreResult<Session> {
        self.verify_purpose(ctx, bearer, TokenPurpose::Access).await
    }

    /// Like [`AuthService::verify`] for a bearer of any purpose.
    pub async fn verify_purpose(
        &self,
        ctx: &RequestContext,
        bearer: &str,
        purpose: TokenPurpose,
    ) -> CoreResult<Session> {
        ctx.bounded(async {
            let result = self.verify_inner(bearer, purpose).await;
            if let Err(e) = &result {
                self.record_token_failure(ctx, AuditAction::TokenVerifyFailed, e).await;
            }
            result
        })
        .await
    }

    async fn verify_inner(&self, bearer: &str, purpose: TokenPurpose) -> CoreResult<Session> {
        let uow = self.store.begin().await?;
        let (_, row) = self.authenticate(uow.as_ref(), bearer, purpose).await?;
        self.load_active(uow.as_ref(), row.principal).await?;
        uow.tokens().touch(&row.token_id, self.clock.now()).await?;
        uow.commit().await?;

        Ok(Session {
            principal: row.principal,
            abilities: row.abilities,
            token_id: row.token_id.to_string(),
            purpose: row.purpose,
            device: row.device,
            expires_at: row.expires_at,
        })
    }

    /// Rotate a refresh bearer: the presented token is revoked and a new pair
    /// with the same abilities and device is issued, all in one transaction.
    #[instrument(skip_all)]
    pub async fn refresh(&self, ctx: &RequestContext, refresh_bearer: &str) -> CoreResult<LoginResult> {
        ctx.bounded(async {
            let result = self.refresh_inner(ctx, refresh_bearer).await;
            if let Err(e) = &result {
                self.record_token_failure(ctx, AuditAction::TokenRefreshFailed, e).await;
            }
            result
        })
        .await
    }

    async fn refresh_inner(&self, ctx: &RequestContext, refresh_bearer: &str) -> CoreResult<LoginResult> {
        let uow = self.store.begin().await?;
        let (claims, row) = self
            .authenticate(uow.as_ref(), refresh_bearer, TokenPurpose::Refresh)
            .await?;
        let record = self.load_active(uow.as_ref(), row.principal).await?;

        let now = self.clock.now();
        if !uow.tokens().revoke_if_live(&claims.jti, now).await? {
            return Err(CoreError::TokenRevoked);
        }

        // A remembered login keeps its longer refresh lifetime across rotations.
        let refresh_ttl = if row.expires_at - row.issued_at > self.settings.refresh_ttl {
            self.settings.remember_ttl
        } else {
            self.settings.refresh_ttl
        };
        let access = self
            .issue(
                uow.as_ref(),
                row.principal,
                TokenPurpose::Access,
                row.abilities.clone(),
                row.device.clone(),
                self.settings.access_ttl,
            )
            .await?;
        let refresh = self
            .issue(
                uow.as_ref(),
                row.principal,
                TokenPurpose::Refresh,
                row.abilities.clone(),
                row.device.clone(),
                refresh_ttl,
            )
            .await?;
        self.audit
            .record(
                uow.as_ref(),
                ctx,
                AuditEvent::new(
                    AuditAction::TokenRefreshed,
                    AuditSubject::new(SubjectKind::Token, &claims.jti),
                )
                .actor(row.principal)
                .metadata(json!({
                    "access_token_id": access.token_id,
                    "refresh_token_id": refresh.token_id,
                })),
            )
            .await?;
        uow.commit().await?;

        Ok(LoginResult {
            access_token: access.bearer,
            refresh_token: refresh.bearer,
            token_type: "Bearer",
            expires_in: self.settings.access_ttl.num_seconds(),
            principal: record.view(),
        })
    }

    /// Mark the bearer's token revoked. Revoking twice, or revoking a token
    /// that is already gone, succeeds.
    #[instrument(skip_all)]
    pub async fn revoke(&self, ctx: &RequestContext, bearer: &str) -> CoreResult<()> {
        ctx.bounded(async {
            let claims = self.codec.decode(bearer)?;
            let principal = claims.principal()?;

            let uow = self.store.begin().await?;
            if uow.tokens().revoke(&claims.jti).await? {
                self.audit
                    .record(
                        uow.as_ref(),
                        ctx,
                        AuditEvent::new(
                            AuditAction::TokenRevoked,
                            AuditSubject::new(SubjectKind::Token, &claims.jti),
                        )
                        .actor(principal),
                    )
                    .await?;
            }
            uow.commit().await?;
            Ok(())
        })
        .await
    }

    /// Revoke and expire every live token of `principal`, sparing `except`.
    #[instrument(skip_all, fields(principal = %principal))]
    pub async fn revoke_all(
        &self,
        ctx: &RequestContext,
        principal: PrincipalRef,
        except: Option<&str>,
    ) -> CoreResult<u64> {
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let revoked = uow
                .tokens()
                .revoke_all(principal, except, self.clock.now())
                .await?;
            self.audit
                .record(
                    uow.as_ref(),
                    ctx,
                    AuditEvent::new(
                        AuditAction::TokensRevokedAll,
                        AuditSubject::new(SubjectKind::Principal, principal),
                    )
                    .actor(principal)
                    .metadata(json!({ "revoked": revoked, "kept": except })),
                )
                .await?;
            uow.commit().await?;
            info!(revoked, "Revoked all tokens");
            Ok(revoked)
        })
        .await
    }

    pub(super) async fn record_token_failure(&self, ctx: &RequestContext, action: AuditAction, error: &CoreError) {
        if matches!(error, CoreError::DeadlineExceeded) {
            return;
        }
        debug!(code = error.code(), %action, "Token rejected");
        self.audit
            .record_detached(
                self.store.as_ref(),
                ctx,
                AuditEvent::new(action, AuditSubject::system())
                    .metadata(json!({ "reason": error.code() })),
            )
            .await;
    }
}
