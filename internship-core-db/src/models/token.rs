use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use internship_core_api::{PrincipalRef, TokenPurpose};
use serde::{Deserialize, Serialize};

/// Length of the hex-encoded 128-bit token id.
pub const TOKEN_ID_LEN: usize = 32;

/// # Documentation
/// - Persistent registry entry of an issued bearer; the source of truth for revocation.
/// - `token_hash` is the hex BLAKE3 digest of the bearer string. The bearer itself is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenModel {
    pub token_id: HeaplessString<TOKEN_ID_LEN>,
    pub token_hash: String,
    pub principal: PrincipalRef,
    pub purpose: TokenPurpose,
    pub abilities: Vec<String>,
    pub device: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked: bool,
}

impl TokenModel {
    /// Live iff not revoked and not yet expired.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}
