//! Login, token and credential endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use internship_core_api::{
    CoreError, EmailVerifyConfirm, ErrorKind, LoginRequest, PasswordChangeRequest,
    PasswordResetConfirm, PasswordResetRequest, PrincipalKind, PrincipalView, RefreshRequest,
};
use internship_core_service::LoginResult;
use serde::Serialize;

use crate::error::ApiResult;
use crate::extractors::{AuthSession, Ctx, ValidatedJson};
use crate::response::{no_content, Success};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PrincipalBody {
    pub principal: PrincipalView,
}

/// POST /login
///
/// Every credential failure answers the same 401 so callers cannot tell an
/// unknown account from a wrong password.
pub async fn login(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Success<LoginResult>> {
    let (kind, credential) = request.credential()?;
    let ctx = ctx.with_device(request.device.clone());
    let result = state
        .auth
        .login(&ctx, kind, credential, &request.password, request.remember)
        .await
        .map_err(|e| {
            if e.is_credential_failure() {
                CoreError::BadCredential
            } else {
                e
            }
        })?;
    Ok(Success::new(result))
}

/// POST /refresh
pub async fn refresh(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<Success<LoginResult>> {
    let result = state.auth.refresh(&ctx, &request.refresh_token).await?;
    Ok(Success::new(result))
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, auth: AuthSession) -> ApiResult<StatusCode> {
    state.auth.revoke(&auth.ctx, &auth.bearer).await?;
    Ok(no_content())
}

/// POST /logout-all
pub async fn logout_all(State(state): State<AppState>, auth: AuthSession) -> ApiResult<StatusCode> {
    state
        .auth
        .revoke_all(&auth.ctx, auth.session.principal, None)
        .await?;
    Ok(no_content())
}

/// POST /password-reset/request
///
/// Answers 204 whether or not the address belongs to anyone.
pub async fn password_reset_request(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ValidatedJson(request): ValidatedJson<PasswordResetRequest>,
) -> ApiResult<StatusCode> {
    let kind = request.kind.unwrap_or(PrincipalKind::Student);
    state
        .auth
        .issue_password_reset(&ctx, kind, &request.email)
        .await?;
    Ok(no_content())
}

/// POST /password-reset/confirm
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ValidatedJson(request): ValidatedJson<PasswordResetConfirm>,
) -> ApiResult<StatusCode> {
    state
        .auth
        .confirm_password_reset(&ctx, &request.token, &request.password)
        .await
        .map_err(invalid_link)?;
    Ok(no_content())
}

/// POST /password/change
pub async fn password_change(
    State(state): State<AppState>,
    auth: AuthSession,
    ValidatedJson(request): ValidatedJson<PasswordChangeRequest>,
) -> ApiResult<StatusCode> {
    state
        .auth
        .change_password(&auth.ctx, &auth.session, &request.current, &request.new)
        .await?;
    Ok(no_content())
}

/// POST /email-verify/request
pub async fn email_verify_request(State(state): State<AppState>, auth: AuthSession) -> ApiResult<StatusCode> {
    state.auth.issue_email_verify(&auth.ctx, &auth.session).await?;
    Ok(no_content())
}

/// POST /email-verify/confirm
pub async fn email_verify_confirm(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ValidatedJson(request): ValidatedJson<EmailVerifyConfirm>,
) -> ApiResult<StatusCode> {
    state
        .auth
        .confirm_email_verify(&ctx, &request.token)
        .await
        .map_err(invalid_link)?;
    Ok(no_content())
}

/// GET /me
pub async fn me(State(state): State<AppState>, auth: AuthSession) -> ApiResult<Success<PrincipalBody>> {
    let principal = state.auth.me(&auth.ctx, &auth.session).await?;
    Ok(Success::new(PrincipalBody { principal }))
}

/// Emailed links report a bad token as a 400 on the `token` field, whatever
/// the cause, so they say nothing about the account behind them.
fn invalid_link(error: CoreError) -> CoreError {
    match error.kind() {
        ErrorKind::Auth => CoreError::validation("token", "invalid or expired"),
        _ => error,
    }
}
