use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error classes used by the HTTP boundary to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Auth,
    State,
    Integrity,
    Infra,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Validation failed")]
    ValidationFailed(Vec<FieldError>),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Bad credential")]
    BadCredential,

    #[error("Principal not found")]
    PrincipalNotFound,

    #[error("Principal is suspended")]
    Suspended,

    #[error("Principal is inactive")]
    Inactive,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Token does not match its principal")]
    TokenMismatch,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token purpose is invalid for this operation")]
    InvalidPurpose,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Illegal transition from {from} via {action}")]
    IllegalTransition { from: String, action: String },

    #[error("Already final: {0}")]
    AlreadyFinal(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied(reason.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed(vec![FieldError::new(field, message)])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::MalformedRequest(_) | CoreError::ValidationFailed(_) => ErrorKind::Input,
            CoreError::Unauthenticated(_)
            | CoreError::BadCredential
            | CoreError::PrincipalNotFound
            | CoreError::Suspended
            | CoreError::Inactive
            | CoreError::TokenExpired
            | CoreError::TokenRevoked
            | CoreError::TokenMismatch
            | CoreError::InvalidSignature
            | CoreError::InvalidPurpose
            | CoreError::PermissionDenied(_) => ErrorKind::Auth,
            CoreError::NotFound { .. }
            | CoreError::Conflict(_)
            | CoreError::IllegalTransition { .. }
            | CoreError::AlreadyFinal(_) => ErrorKind::State,
            CoreError::DuplicateKey(_) | CoreError::ForeignKeyViolation(_) => ErrorKind::Integrity,
            CoreError::StoreUnavailable(_) | CoreError::DeadlineExceeded | CoreError::Internal(_) => {
                ErrorKind::Infra
            }
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::MalformedRequest(_) => "malformed_request",
            CoreError::ValidationFailed(_) => "validation_failed",
            CoreError::Unauthenticated(_) => "unauthenticated",
            CoreError::BadCredential => "bad_credential",
            CoreError::PrincipalNotFound => "principal_not_found",
            CoreError::Suspended => "suspended",
            CoreError::Inactive => "inactive",
            CoreError::TokenExpired => "token_expired",
            CoreError::TokenRevoked => "token_revoked",
            CoreError::TokenMismatch => "token_mismatch",
            CoreError::InvalidSignature => "invalid_signature",
            CoreError::InvalidPurpose => "invalid_purpose",
            CoreError::PermissionDenied(_) => "permission_denied",
            CoreError::NotFound { .. } => "not_found",
            CoreError::Conflict(_) => "conflict",
            CoreError::IllegalTransition { .. } => "illegal_transition",
            CoreError::AlreadyFinal(_) => "already_final",
            CoreError::DuplicateKey(_) => "duplicate_key",
            CoreError::ForeignKeyViolation(_) => "foreign_key_violation",
            CoreError::StoreUnavailable(_) => "store_unavailable",
            CoreError::DeadlineExceeded => "deadline_exceeded",
            CoreError::Internal(_) => "internal",
        }
    }

    /// True for failures that the login path collapses into `BadCredential`.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            CoreError::BadCredential
                | CoreError::PrincipalNotFound
                | CoreError::Suspended
                | CoreError::Inactive
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(CoreError::validation("email", "required").kind(), ErrorKind::Input);
        assert_eq!(CoreError::TokenRevoked.kind(), ErrorKind::Auth);
        assert_eq!(CoreError::permission_denied("nope").kind(), ErrorKind::Auth);
        assert_eq!(CoreError::not_found("approval", 7).kind(), ErrorKind::State);
        assert_eq!(CoreError::AlreadyFinal("approved".into()).kind(), ErrorKind::State);
        assert_eq!(CoreError::DuplicateKey("x".into()).kind(), ErrorKind::Integrity);
        assert_eq!(CoreError::DeadlineExceeded.kind(), ErrorKind::Infra);
    }

    #[test]
    fn test_credential_failures_are_collapsible() {
        assert!(CoreError::Suspended.is_credential_failure());
        assert!(CoreError::PrincipalNotFound.is_credential_failure());
        assert!(!CoreError::TokenExpired.is_credential_failure());
    }

    #[test]
    fn test_not_found_message() {
        let err = CoreError::not_found("approval", 8);
        assert_eq!(err.to_string(), "approval 8 not found");
        assert_eq!(err.code(), "not_found");
    }
}
