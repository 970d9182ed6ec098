use chrono::{DateTime, Utc};
use internship_core_api::{has_ability, CoreError, CoreResult, PrincipalRef, PrincipalView, TokenPurpose};
use serde::Serialize;

/// A verified bearer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub principal: PrincipalRef,
    pub abilities: Vec<String>,
    pub token_id: String,
    pub purpose: TokenPurpose,
    pub device: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn has_ability(&self, required: &str) -> bool {
        has_ability(&self.abilities, required)
    }

    pub fn require(&self, required: &str) -> CoreResult<()> {
        if self.has_ability(required) {
            Ok(())
        } else {
            Err(CoreError::permission_denied(format!("missing ability '{required}'")))
        }
    }

    /// Passes when any of `required` is held.
    pub fn require_any(&self, required: &[&str]) -> CoreResult<()> {
        if required.iter().any(|ability| self.has_ability(ability)) {
            Ok(())
        } else {
            Err(CoreError::permission_denied(format!(
                "missing one of abilities {required:?}"
            )))
        }
    }
}

/// Token pair handed out by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    pub principal: PrincipalView,
}
