use internship_core_api::{
    AuditAction, AuditSubject, CoreError, CoreResult, NotificationCategory, PrincipalKind,
    PrincipalStatus, SubjectKind, TokenPurpose, ABILITY_EMAIL_VERIFY, ABILITY_PASSWORD_RESET,
};
use serde_json::json;
use tracing::{info, instrument};

use super::service::AuthService;
use super::session::Session;
use crate::audit::AuditEvent;
use crate::context::RequestContext;

impl AuthService {
    /// Queue a password-reset bearer for the active principal owning `email`.
    ///
    /// Succeeds whether or not such a principal exists.
    #[instrument(skip_all, fields(kind = %kind))]
    pub async fn issue_password_reset(
        &self,
        ctx: &RequestContext,
        kind: PrincipalKind,
        email: &str,
    ) -> CoreResult<()> {
        let email = email.trim().to_lowercase();
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let record = uow
                .principals()
                .find_by_email(kind, &email)
                .await?
                .filter(|record| record.status() == PrincipalStatus::Active);

            let Some(record) = record else {
                self.audit
                    .record(
                        uow.as_ref(),
                        ctx,
                        AuditEvent::new(AuditAction::PasswordResetRequested, AuditSubject::system())
                            .metadata(json!({ "kind": kind.as_str(), "known": false })),
                    )
                    .await?;
                uow.commit().await?;
                return Ok(());
            };

            let principal = record.reference();
            let token = self
                .issue(
                    uow.as_ref(),
                    principal,
                    TokenPurpose::PasswordReset,
                    vec![ABILITY_PASSWORD_RESET.to_string()],
                    ctx.device.clone(),
                    self.settings.reset_ttl,
                )
                .await?;
            self.outbox
                .enqueue(
                    uow.as_ref(),
                    principal,
                    NotificationCategory::PasswordReset,
                    json!({
                        "email": record.email(),
                        "token_id": token.token_id,
                        "expires_at": token.expires_at,
                    }),
                )
                .await?;
            self.audit
                .record(
                    uow.as_ref(),
                    ctx,
                    AuditEvent::new(
                        AuditAction::PasswordResetRequested,
                        AuditSubject::new(SubjectKind::Principal, principal),
                    )
                    .actor(principal)
                    .metadata(json!({ "token_id": token.token_id, "known": true })),
                )
                .await?;
            uow.commit().await?;
            self.courier
                .deliver(principal, NotificationCategory::PasswordReset, &token.token_id, &token.bearer);
            Ok(())
        })
        .await
    }

    /// Queue an email-verification bearer for the session's principal.
    #[instrument(skip_all, fields(principal = %session.principal))]
    pub async fn issue_email_verify(&self, ctx: &RequestContext, session: &Session) -> CoreResult<()> {
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let record = self.load_active(uow.as_ref(), session.principal).await?;
            let token = self
                .issue(
                    uow.as_ref(),
                    session.principal,
                    TokenPurpose::EmailVerify,
                    vec![ABILITY_EMAIL_VERIFY.to_string()],
                    ctx.device.clone(),
                    self.settings.verify_ttl,
                )
                .await?;
            self.outbox
                .enqueue(
                    uow.as_ref(),
                    session.principal,
                    NotificationCategory::EmailVerify,
                    json!({
                        "email": record.email(),
                        "token_id": token.token_id,
                        "expires_at": token.expires_at,
                    }),
                )
                .await?;
            self.audit
                .record(
                    uow.as_ref(),
                    ctx,
                    AuditEvent::new(
                        AuditAction::EmailVerifyRequested,
                        AuditSubject::new(SubjectKind::Principal, session.principal),
                    )
                    .actor(session.principal)
                    .metadata(json!({ "token_id": token.token_id })),
                )
                .await?;
            uow.commit().await?;
            self.courier.deliver(
                session.principal,
                NotificationCategory::EmailVerify,
                &token.token_id,
                &token.bearer,
            );
            Ok(())
        })
        .await
    }

    /// Consume a password-reset bearer, replace the hash and revoke every
    /// token of the principal.
    #[instrument(skip_all)]
    pub async fn confirm_password_reset(
        &self,
        ctx: &RequestContext,
        bearer: &str,
        new_password: &str,
    ) -> CoreResult<()> {
        ctx.bounded(async {
            let result = self.confirm_password_reset_inner(ctx, bearer, new_password).await;
            if let Err(e) = &result {
                self.record_token_failure(ctx, AuditAction::PasswordResetFailed, e).await;
            }
            result
        })
        .await
    }

    async fn confirm_password_reset_inner(
        &self,
        ctx: &RequestContext,
        bearer: &str,
        new_password: &str,
    ) -> CoreResult<()> {
        let new_hash = self.hash_password(new_password).await?;

        let uow = self.store.begin().await?;
        let row = self
            .consume(uow.as_ref(), bearer, TokenPurpose::PasswordReset, ABILITY_PASSWORD_RESET)
            .await?;
        let record = self.load_active(uow.as_ref(), row.principal).await?;
        let now = self.clock.now();
        uow.principals()
            .update_password_hash(row.principal, record.password_hash(), &new_hash, now)
            .await?;
        let revoked = uow.tokens().revoke_all(row.principal, None, now).await?;
        self.audit
            .record(
                uow.as_ref(),
                ctx,
                AuditEvent::new(
                    AuditAction::PasswordResetCompleted,
                    AuditSubject::new(SubjectKind::Principal, row.principal),
                )
                .actor(row.principal)
                .metadata(json!({ "token_id": row.token_id.as_str(), "revoked": revoked })),
            )
            .await?;
        uow.commit().await?;
        info!(principal = %row.principal, revoked, "Password reset completed");
        Ok(())
    }

    /// Consume an email-verify bearer and mark the address verified.
    #[instrument(skip_all)]
    pub async fn confirm_email_verify(&self, ctx: &RequestContext, bearer: &str) -> CoreResult<()> {
        ctx.bounded(async {
            let result = async {
                let uow = self.store.begin().await?;
                let row = self
                    .consume(uow.as_ref(), bearer, TokenPurpose::EmailVerify, ABILITY_EMAIL_VERIFY)
                    .await?;
                self.load_active(uow.as_ref(), row.principal).await?;
                uow.principals()
                    .mark_email_verified(row.principal, self.clock.now())
                    .await?;
                self.audit
                    .record(
                        uow.as_ref(),
                        ctx,
                        AuditEvent::new(
                            AuditAction::EmailVerified,
                            AuditSubject::new(SubjectKind::Principal, row.principal),
                        )
                        .actor(row.principal),
                    )
                    .await?;
                uow.commit().await?;
                Ok::<(), CoreError>(())
            }
            .await;
            if let Err(e) = &result {
                self.record_token_failure(ctx, AuditAction::TokenVerifyFailed, e).await;
            }
            result
        })
        .await
    }

    /// Replace the password after checking the current one, then revoke every
    /// other token of the principal.
    ///
    /// The hash is swapped only if it still equals the one checked, so the
    /// check, the swap and the revocation behave as one transaction.
    #[instrument(skip_all, fields(principal = %session.principal))]
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        session: &Session,
        current: &str,
        new_password: &str,
    ) -> CoreResult<()> {
        ctx.bounded(async {
            let result = self.change_password_inner(ctx, session, current, new_password).await;
            if let Err(e) = &result {
                self.audit
                    .record_detached(
                        self.store.as_ref(),
                        ctx,
                        AuditEvent::new(
                            AuditAction::PasswordChangeFailed,
                            AuditSubject::new(SubjectKind::Principal, session.principal),
                        )
                        .actor(session.principal)
                        .metadata(json!({ "reason": e.code() })),
                    )
                    .await;
            }
            result
        })
        .await
    }

    async fn change_password_inner(
        &self,
        ctx: &RequestContext,
        session: &Session,
        current: &str,
        new_password: &str,
    ) -> CoreResult<()> {
        let record = {
            let uow = self.store.begin().await?;
            let record = self.load_active(uow.as_ref(), session.principal).await?;
            uow.rollback().await?;
            record
        };
        if !self.verify_password(current, record.password_hash()).await? {
            return Err(CoreError::BadCredential);
        }
        let new_hash = self.hash_password(new_password).await?;

        let uow = self.store.begin().await?;
        let now = self.clock.now();
        uow.principals()
            .update_password_hash(session.principal, record.password_hash(), &new_hash, now)
            .await?;
        let revoked = uow
            .tokens()
            .revoke_all(session.principal, Some(session.token_id.as_str()), now)
            .await?;
        self.audit
            .record(
                uow.as_ref(),
                ctx,
                AuditEvent::new(
                    AuditAction::PasswordChanged,
                    AuditSubject::new(SubjectKind::Principal, session.principal),
                )
                .actor(session.principal)
                .metadata(json!({ "revoked": revoked })),
            )
            .await?;
        uow.commit().await?;
        Ok(())
    }
}
