use serde::Deserialize;
use validator::Validate;

use crate::domain::principal::{Credential, PrincipalKind, StudentId};
use crate::error::{CoreError, CoreResult};

pub const PASSWORD_MIN_LEN: u64 = 8;
pub const PASSWORD_MAX_LEN: u64 = 128;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 11))]
    pub student_id: Option<String>,
    /// Selects the principal table when logging in by email. Defaults to `super_admin`.
    pub kind: Option<PrincipalKind>,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    #[serde(default)]
    pub remember: bool,
    #[validate(length(max = 255))]
    pub device: Option<String>,
}

impl LoginRequest {
    /// Resolves which principal table to search and by which key.
    pub fn credential(&self) -> CoreResult<(PrincipalKind, Credential)> {
        match (&self.student_id, &self.email) {
            (Some(student_id), _) => {
                let student_id: StudentId = student_id.parse()?;
                Ok((PrincipalKind::Student, Credential::StudentId(student_id)))
            }
            (None, Some(email)) => Ok((
                self.kind.unwrap_or(PrincipalKind::SuperAdmin),
                Credential::Email(email.trim().to_lowercase()),
            )),
            (None, None) => Err(CoreError::validation(
                "email",
                "either email or student_id is required",
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    pub kind: Option<PrincipalKind>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordResetConfirm {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = PASSWORD_MIN_LEN, max = PASSWORD_MAX_LEN))]
    pub password: String,
    #[validate(must_match(other = "password", message = "does not match password"))]
    pub confirm: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordChangeRequest {
    #[validate(length(min = 1))]
    pub current: String,
    #[validate(length(min = PASSWORD_MIN_LEN, max = PASSWORD_MAX_LEN))]
    pub new: String,
    #[validate(must_match(other = "new", message = "does not match new password"))]
    pub confirm: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmailVerifyConfirm {
    #[validate(length(min = 1))]
    pub token: String,
}
