use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Duration;
use internship_core_api::{
    CoreError, CoreResult, Credential, PrincipalKind, PrincipalRef, PrincipalStatus, TokenPurpose,
    ABILITY_ALL,
};

use crate::auth::{BcryptHasher, PasswordHasher};
use crate::context::RequestContext;
use crate::test_support::{test_settings, Fault, Harness};
use crate::AuthService;

const PASSWORD: &str = "Passw0rd!";

fn by_student_id(id: &str) -> Credential {
    Credential::StudentId(id.parse().unwrap())
}

async fn harness_with_student() -> (Harness, PrincipalRef) {
    let harness = Harness::new();
    let student = harness.seed_student(1, "65130001", "a@x.edu", PASSWORD).await;
    (harness, student)
}

fn delivered_bearer(harness: &Harness) -> String {
    harness.courier.last_bearer().expect("a delivered bearer")
}

#[tokio::test]
async fn test_login_then_verify_binds_the_principal() {
    let (harness, student) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();

    let result = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap();
    assert_eq!(result.expires_in, 900);
    assert_eq!(result.token_type, "Bearer");
    assert_eq!(result.principal.student_id.as_deref(), Some("65130001"));

    let session = auth.verify(&ctx, &result.access_token).await.unwrap();
    assert_eq!(session.principal, student);
    assert!(session.has_ability("approvals.withdraw"));

    let state = harness.store.snapshot().await;
    assert!(state.students[&1].last_login_at.is_some());
    assert!(harness.audit_actions().await.contains(&"login_succeeded".to_string()));
}

#[tokio::test]
async fn test_login_failures_stay_distinct_and_are_audited() {
    let (harness, student) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();

    let err = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), "wrong", false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::BadCredential));

    let err = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65139999"), PASSWORD, false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PrincipalNotFound));

    harness.set_status(student, PrincipalStatus::Suspended).await;
    let err = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Suspended));
    assert!(err.is_credential_failure());

    let failures = harness
        .audit_actions()
        .await
        .into_iter()
        .filter(|a| a == "login_failed")
        .count();
    assert_eq!(failures, 3);
}

struct CountingHasher {
    inner: BcryptHasher,
    verified: AtomicUsize,
}

impl PasswordHasher for CountingHasher {
    fn hash(&self, plain: &str) -> CoreResult<String> {
        self.inner.hash(plain)
    }

    fn verify(&self, plain: &str, hash: &str) -> CoreResult<bool> {
        self.verified.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(plain, hash)
    }
}

#[tokio::test]
async fn test_every_login_rejection_pays_for_a_hash_check() {
    let (harness, student) = harness_with_student().await;
    let hasher = Arc::new(CountingHasher {
        inner: BcryptHasher::new(4, None),
        verified: AtomicUsize::new(0),
    });
    let auth = harness.auth().with_hasher(hasher.clone());
    let ctx = RequestContext::background();

    for _ in 0..2 {
        let err = auth
            .login(&ctx, PrincipalKind::Student, by_student_id("65139999"), PASSWORD, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PrincipalNotFound));
    }
    assert_eq!(hasher.verified.load(Ordering::SeqCst), 2);

    harness.set_status(student, PrincipalStatus::Inactive).await;
    let err = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), "wrong", false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Inactive));
    assert_eq!(hasher.verified.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_super_admin_logs_in_by_email() {
    let harness = Harness::new();
    let admin = harness.seed_admin(5, "root@x.edu", PASSWORD, &[ABILITY_ALL]).await;
    let auth = harness.auth();
    let ctx = RequestContext::background();

    let result = auth
        .login(
            &ctx,
            PrincipalKind::SuperAdmin,
            Credential::Email("root@x.edu".into()),
            PASSWORD,
            false,
        )
        .await
        .unwrap();
    let session = auth.verify(&ctx, &result.access_token).await.unwrap();
    assert_eq!(session.principal, admin);
    assert!(session.has_ability("anything.at.all"));
}

#[tokio::test]
async fn test_refresh_rotates_once() {
    let (harness, student) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    let first = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap();

    let second = auth.refresh(&ctx, &first.refresh_token).await.unwrap();
    let err = auth.refresh(&ctx, &first.refresh_token).await.unwrap_err();
    assert!(matches!(err, CoreError::TokenRevoked));

    let session = auth.verify(&ctx, &second.access_token).await.unwrap();
    assert_eq!(session.principal, student);
    let refreshed = auth
        .verify_purpose(&ctx, &second.refresh_token, TokenPurpose::Refresh)
        .await
        .unwrap();
    assert_eq!(refreshed.abilities, session.abilities);
}

#[tokio::test]
async fn test_remembered_refresh_keeps_its_lifetime() {
    let (harness, _) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    let first = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, true)
        .await
        .unwrap();
    let second = auth.refresh(&ctx, &first.refresh_token).await.unwrap();

    harness.clock.advance(Duration::days(20));
    assert!(auth.refresh(&ctx, &second.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_access_bearer_is_not_a_refresh_bearer() {
    let (harness, _) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    let result = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap();

    let err = auth.refresh(&ctx, &result.access_token).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidPurpose));
    let err = auth.verify(&ctx, &result.refresh_token).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidPurpose));
}

#[tokio::test]
async fn test_expired_and_revoked_bearers_are_rejected() {
    let (harness, _) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    let result = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap();

    auth.revoke(&ctx, &result.refresh_token).await.unwrap();
    auth.revoke(&ctx, &result.refresh_token).await.unwrap();
    let err = auth.refresh(&ctx, &result.refresh_token).await.unwrap_err();
    assert!(matches!(err, CoreError::TokenRevoked));

    harness.clock.advance(Duration::minutes(16));
    let err = auth.verify(&ctx, &result.access_token).await.unwrap_err();
    assert!(matches!(err, CoreError::TokenExpired));
}

#[tokio::test]
async fn test_tampered_bearer_fails_signature() {
    let (harness, _) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    let result = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap();

    let mut tampered = result.access_token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });
    let err = auth.verify(&ctx, &tampered).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidSignature | CoreError::Unauthenticated(_)));

    let err = auth.verify(&ctx, "not-a-token").await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthenticated(_)));
}

#[tokio::test]
async fn test_change_password_keeps_only_the_presenter() {
    let (harness, student) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    let first = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap();
    let second = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap();

    let session = auth.verify(&ctx, &first.access_token).await.unwrap();
    auth.change_password(&ctx, &session, PASSWORD, "N3w-secret!")
        .await
        .unwrap();

    assert_eq!(auth.verify(&ctx, &first.access_token).await.unwrap().principal, student);
    assert!(matches!(
        auth.verify(&ctx, &second.access_token).await,
        Err(CoreError::TokenRevoked)
    ));
    assert!(matches!(
        auth.refresh(&ctx, &second.refresh_token).await,
        Err(CoreError::TokenRevoked)
    ));

    assert!(auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), "N3w-secret!", false)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_change_password_rejects_wrong_current() {
    let (harness, _) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    let result = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap();
    let session = auth.verify(&ctx, &result.access_token).await.unwrap();

    let err = auth
        .change_password(&ctx, &session, "guess", "N3w-secret!")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::BadCredential));
    assert!(harness
        .audit_actions()
        .await
        .contains(&"password_change_failed".to_string()));
    assert!(auth.verify(&ctx, &result.access_token).await.is_ok());
}

#[tokio::test]
async fn test_password_reset_flow() {
    let (harness, _) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    let login = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap();

    auth.issue_password_reset(&ctx, PrincipalKind::Student, "A@X.edu")
        .await
        .unwrap();
    let bearer = delivered_bearer(&harness);

    auth.confirm_password_reset(&ctx, &bearer, "Reset-p4ss")
        .await
        .unwrap();
    assert!(matches!(
        auth.confirm_password_reset(&ctx, &bearer, "Again-p4ss").await,
        Err(CoreError::TokenRevoked)
    ));
    assert!(matches!(
        auth.verify(&ctx, &login.access_token).await,
        Err(CoreError::TokenRevoked)
    ));
    assert!(auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), "Reset-p4ss", false)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_password_reset_is_silent_for_unknown_email() {
    let (harness, _) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();

    auth.issue_password_reset(&ctx, PrincipalKind::Student, "nobody@x.edu")
        .await
        .unwrap();

    let state = harness.store.snapshot().await;
    assert!(state.notifications.is_empty());
    assert!(state.tokens.is_empty());
    assert_eq!(harness.courier.count(), 0);
    assert_eq!(state.audit.last().unwrap().metadata["known"], false);
}

#[tokio::test]
async fn test_reset_notification_names_the_token_without_carrying_it() {
    let (harness, student) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    auth.issue_password_reset(&ctx, PrincipalKind::Student, "a@x.edu")
        .await
        .unwrap();
    let bearer = delivered_bearer(&harness);

    let state = harness.store.snapshot().await;
    let notification = state.notifications.last().unwrap();
    assert_eq!(notification.recipient, student);
    assert!(notification.payload.get("token").is_none());
    assert!(!notification.payload.to_string().contains(&bearer));
    let token_id = notification.payload["token_id"].as_str().unwrap();
    assert!(state.tokens.contains_key(token_id));
}

#[tokio::test]
async fn test_reset_bearer_cannot_verify_email() {
    let (harness, _) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    auth.issue_password_reset(&ctx, PrincipalKind::Student, "a@x.edu")
        .await
        .unwrap();
    let bearer = delivered_bearer(&harness);

    let err = auth.confirm_email_verify(&ctx, &bearer).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidPurpose));
    let err = auth.verify(&ctx, &bearer).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidPurpose));
}

#[tokio::test]
async fn test_email_verification_flow() {
    let (harness, _) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    let login = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap();
    let session = auth.verify(&ctx, &login.access_token).await.unwrap();

    auth.issue_email_verify(&ctx, &session).await.unwrap();
    let bearer = delivered_bearer(&harness);
    auth.confirm_email_verify(&ctx, &bearer).await.unwrap();

    let view = auth.me(&ctx, &session).await.unwrap();
    assert!(view.email_verified);
    assert!(auth.confirm_email_verify(&ctx, &bearer).await.is_err());
}

#[tokio::test]
async fn test_reset_bearer_expires() {
    let (harness, _) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    auth.issue_password_reset(&ctx, PrincipalKind::Student, "a@x.edu")
        .await
        .unwrap();
    let bearer = delivered_bearer(&harness);

    harness.clock.advance(Duration::hours(2));
    let err = auth
        .confirm_password_reset(&ctx, &bearer, "Reset-p4ss")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::TokenExpired));
}

#[tokio::test]
async fn test_revoke_all_counts_live_tokens() {
    let (harness, student) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    for _ in 0..2 {
        auth.login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
            .await
            .unwrap();
    }

    assert_eq!(auth.revoke_all(&ctx, student, None).await.unwrap(), 4);
    assert_eq!(auth.revoke_all(&ctx, student, None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_rotation_keeps_the_presented_refresh_token() {
    let (harness, _) = harness_with_student().await;
    let auth = harness.auth();
    let ctx = RequestContext::background();
    let first = auth
        .login(&ctx, PrincipalKind::Student, by_student_id("65130001"), PASSWORD, false)
        .await
        .unwrap();
    let tokens = harness.store.snapshot().await.tokens;
    assert_eq!(tokens.len(), 2);

    let broken = AuthService::new(harness.faulty(Fault::FailCommit), harness.clock.clone(), test_settings()).unwrap();
    let err = broken.refresh(&ctx, &first.refresh_token).await.unwrap_err();
    assert!(matches!(err, CoreError::StoreUnavailable(_)));
    assert_eq!(harness.store.snapshot().await.tokens, tokens);

    let stalled = AuthService::new(harness.faulty(Fault::StallCommit), harness.clock.clone(), test_settings()).unwrap();
    let bounded = RequestContext::background().with_timeout(std::time::Duration::from_millis(50));
    let err = stalled.refresh(&bounded, &first.refresh_token).await.unwrap_err();
    assert!(matches!(err, CoreError::DeadlineExceeded));
    assert_eq!(harness.store.snapshot().await.tokens, tokens);

    let second = auth.refresh(&ctx, &first.refresh_token).await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);
    assert_eq!(harness.store.snapshot().await.tokens.len(), 4);
}
