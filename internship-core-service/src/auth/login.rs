use internship_core_api::{
    AuditAction, AuditSubject, CoreError, CoreResult, Credential, PrincipalKind, SubjectKind,
    TokenPurpose,
};
use internship_core_db::models::principal::PrincipalRecord;
use serde_json::json;
use tracing::{debug, instrument};

use super::service::{ensure_active, AuthService};
use super::session::LoginResult;
use crate::audit::AuditEvent;
use crate::context::RequestContext;

impl AuthService {
    /// Verify a credential and hand out an access and a refresh token.
    ///
    /// Students are found by student id, or by email when `kind` is
    /// `Student` and an email is given; SuperAdmins by email. The failure
    /// kinds stay distinct here; the HTTP boundary collapses them.
    #[instrument(skip_all, fields(kind = %kind))]
    pub async fn login(
        &self,
        ctx: &RequestContext,
        kind: PrincipalKind,
        credential: Credential,
        password: &str,
        remember: bool,
    ) -> CoreResult<LoginResult> {
        ctx.bounded(async {
            let result = self.login_inner(ctx, kind, &credential, password, remember).await;
            if let Err(e) = &result {
                debug!(code = e.code(), "Login rejected");
                let key = match &credential {
                    Credential::StudentId(id) => id.to_string(),
                    Credential::Email(email) => email.clone(),
                };
                self.audit
                    .record_detached(
                        self.store.as_ref(),
                        ctx,
                        AuditEvent::new(AuditAction::LoginFailed, AuditSubject::new(SubjectKind::Principal, key))
                            .metadata(json!({ "kind": kind.as_str(), "reason": e.code() })),
                    )
                    .await;
            }
            result
        })
        .await
    }

    async fn login_inner(
        &self,
        ctx: &RequestContext,
        kind: PrincipalKind,
        credential: &Credential,
        password: &str,
        remember: bool,
    ) -> CoreResult<LoginResult> {
        let record = {
            let uow = self.store.begin().await?;
            let record = match credential {
                Credential::StudentId(student_id) => uow
                    .principals()
                    .find_student_by_student_id(student_id)
                    .await?
                    .map(PrincipalRecord::Student),
                Credential::Email(email) => uow.principals().find_by_email(kind, email).await?,
            };
            uow.rollback().await?;
            match record {
                Some(record) => record,
                None => {
                    self.verify_decoy(password).await?;
                    return Err(CoreError::PrincipalNotFound);
                }
            }
        };

        // No transaction is open across the slow hash check. It runs before the
        // status gate so every rejection pays for one.
        let matched = self.verify_password(password, record.password_hash()).await?;
        ensure_active(record.status())?;
        if !matched {
            return Err(CoreError::BadCredential);
        }

        let principal = record.reference();
        let abilities = record.abilities();
        let now = self.clock.now();
        let refresh_ttl = if remember {
            self.settings.remember_ttl
        } else {
            self.settings.refresh_ttl
        };

        let uow = self.store.begin().await?;
        uow.principals().touch_last_login(principal, now).await?;
        let access = self
            .issue(
                uow.as_ref(),
                principal,
                TokenPurpose::Access,
                abilities.clone(),
                ctx.device.clone(),
                self.settings.access_ttl,
            )
            .await?;
        let refresh = self
            .issue(
                uow.as_ref(),
                principal,
                TokenPurpose::Refresh,
                abilities,
                ctx.device.clone(),
                refresh_ttl,
            )
            .await?;
        self.audit
            .record(
                uow.as_ref(),
                ctx,
                AuditEvent::new(
                    AuditAction::LoginSucceeded,
                    AuditSubject::new(SubjectKind::Principal, principal),
                )
                .actor(principal)
                .metadata(json!({
                    "access_token_id": access.token_id,
                    "refresh_token_id": refresh.token_id,
                    "remember": remember,
                })),
            )
            .await?;
        uow.commit().await?;

        let mut view = record.view();
        view.last_login_at = Some(now);
        Ok(LoginResult {
            access_token: access.bearer,
            refresh_token: refresh.bearer,
            token_type: "Bearer",
            expires_in: self.settings.access_ttl.num_seconds(),
            principal: view,
        })
    }
}
