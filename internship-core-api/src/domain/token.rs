use serde::{Deserialize, Serialize};
use std::fmt;

/// Ability carried by password-reset tokens.
pub const ABILITY_PASSWORD_RESET: &str = "password:reset";

/// Ability carried by email-verification tokens.
pub const ABILITY_EMAIL_VERIFY: &str = "email:verify";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "token_purpose", rename_all = "snake_case"))]
pub enum TokenPurpose {
    Access,
    Refresh,
    PasswordReset,
    EmailVerify,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Access => "access",
            TokenPurpose::Refresh => "refresh",
            TokenPurpose::PasswordReset => "password_reset",
            TokenPurpose::EmailVerify => "email_verify",
        }
    }

    /// Single-purpose tokens are consumed on first successful use.
    pub fn is_single_use(&self) -> bool {
        matches!(self, TokenPurpose::PasswordReset | TokenPurpose::EmailVerify)
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
