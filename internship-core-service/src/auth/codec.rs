use chrono::{DateTime, Utc};
use internship_core_api::{CoreError, CoreResult, PrincipalKind, PrincipalRef, TokenPurpose};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Claims carried by every bearer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// `kind:id` of the principal.
    pub sub: String,
    pub kind: PrincipalKind,
    pub pid: i64,
    pub purpose: TokenPurpose,
    pub abilities: Vec<String>,
    /// Id of the persistent token row.
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    /// The principal named by the claims. `sub` must agree with `kind` and `pid`.
    pub fn principal(&self) -> CoreResult<PrincipalRef> {
        let principal = PrincipalRef::new(self.kind, self.pid);
        match PrincipalRef::parse_subject(&self.sub) {
            Some(subject) if subject == principal => Ok(principal),
            _ => Err(CoreError::TokenMismatch),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn is_early_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() < self.nbf
    }
}

/// Signs and checks bearers with a shared secret.
///
/// Only HS256 is accepted; a bearer whose header names any other algorithm
/// fails as `InvalidSignature`. Expiry and not-before are deliberately left to
/// the caller so that they are judged against the service clock.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
}

impl TokenCodec {
    pub fn new(secret: &str, issuer: &str, audience: &str) -> CoreResult<Self> {
        if secret.is_empty() {
            return Err(CoreError::internal("JWT secret is not configured"));
        }
        if secret.len() < 32 {
            warn!("JWT secret is shorter than recommended (32 bytes)");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);
        validation.validate_exp = false;
        validation.validate_nbf = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer: issuer.to_string(),
            audience: audience.to_string(),
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn encode(&self, claims: &Claims) -> CoreResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| CoreError::internal(format!("Failed to sign token: {e}")))
    }

    pub fn decode(&self, bearer: &str) -> CoreResult<Claims> {
        decode::<Claims>(bearer, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidToken
                | JwtErrorKind::Base64(_)
                | JwtErrorKind::Json(_)
                | JwtErrorKind::Utf8(_) => CoreError::Unauthenticated("malformed bearer".to_string()),
                _ => CoreError::InvalidSignature,
            })
    }
}
