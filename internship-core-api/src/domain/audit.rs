use serde::{Deserialize, Serialize};
use std::fmt;

/// Action codes written to the security log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    LoginSucceeded,
    LoginFailed,
    TokenVerifyFailed,
    TokenRefreshed,
    TokenRefreshFailed,
    TokenRevoked,
    TokensRevokedAll,
    PasswordChanged,
    PasswordChangeFailed,
    PasswordResetRequested,
    PasswordResetCompleted,
    PasswordResetFailed,
    EmailVerifyRequested,
    EmailVerified,
    ApprovalRegistered,
    ApprovalTransitioned,
    ApprovalTransitionRepeated,
    CommitteeAssigned,
    TrainingRegistered,
    EvaluatorAssigned,
    EvaluationCompleted,
    EvaluationsOverdue,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::LoginSucceeded => "login_succeeded",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::TokenVerifyFailed => "token_verify_failed",
            AuditAction::TokenRefreshed => "token_refreshed",
            AuditAction::TokenRefreshFailed => "token_refresh_failed",
            AuditAction::TokenRevoked => "token_revoked",
            AuditAction::TokensRevokedAll => "tokens_revoked_all",
            AuditAction::PasswordChanged => "password_changed",
            AuditAction::PasswordChangeFailed => "password_change_failed",
            AuditAction::PasswordResetRequested => "password_reset_requested",
            AuditAction::PasswordResetCompleted => "password_reset_completed",
            AuditAction::PasswordResetFailed => "password_reset_failed",
            AuditAction::EmailVerifyRequested => "email_verify_requested",
            AuditAction::EmailVerified => "email_verified",
            AuditAction::ApprovalRegistered => "approval_registered",
            AuditAction::ApprovalTransitioned => "approval_transitioned",
            AuditAction::ApprovalTransitionRepeated => "approval_transition_repeated",
            AuditAction::CommitteeAssigned => "committee_assigned",
            AuditAction::TrainingRegistered => "training_registered",
            AuditAction::EvaluatorAssigned => "evaluator_assigned",
            AuditAction::EvaluationCompleted => "evaluation_completed",
            AuditAction::EvaluationsOverdue => "evaluations_overdue",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Principal,
    Token,
    Approval,
    Training,
    Tracker,
    System,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Principal => "principal",
            SubjectKind::Token => "token",
            SubjectKind::Approval => "approval",
            SubjectKind::Training => "training",
            SubjectKind::Tracker => "tracker",
            SubjectKind::System => "system",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity an audit entry is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSubject {
    pub kind: SubjectKind,
    pub id: String,
}

impl AuditSubject {
    pub fn new(kind: SubjectKind, id: impl ToString) -> Self {
        Self {
            kind,
            id: id.to_string(),
        }
    }

    pub fn system() -> Self {
        Self::new(SubjectKind::System, "-")
    }
}
