use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Duration, Utc};
use internship_core_api::{
    has_ability, CoreError, CoreResult, PrincipalRef, PrincipalStatus, PrincipalView, TokenPurpose,
};
use internship_core_db::models::principal::PrincipalRecord;
use internship_core_db::models::token::TokenModel;
use internship_core_db::repository::{Store, UnitOfWork};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::instrument;

use super::codec::{Claims, TokenCodec};
use super::password::{BcryptHasher, PasswordHasher};
use super::session::Session;
use crate::audit::AuditWriter;
use crate::clock::Clock;
use crate::context::RequestContext;
use crate::outbox::{Courier, NullCourier, Outbox};
use crate::settings::AuthSettings;

/// A freshly minted bearer and the id of its persistent row.
pub(super) struct IssuedToken {
    pub bearer: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Credential verification and the token lifecycle.
///
/// Operations are split across this module's siblings: `login`, `rotation`
/// (verify, refresh, revoke) and `credentials` (password and email flows).
pub struct AuthService {
    pub(super) store: Arc<dyn Store>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) codec: TokenCodec,
    pub(super) hasher: Arc<dyn PasswordHasher>,
    pub(super) settings: AuthSettings,
    pub(super) audit: AuditWriter,
    pub(super) outbox: Outbox,
    pub(super) courier: Arc<dyn Courier>,
    /// Hash checked against when no usable principal matched the credential.
    pub(super) decoy_hash: OnceLock<String>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, settings: AuthSettings) -> CoreResult<Self> {
        let codec = TokenCodec::new(&settings.jwt_secret, &settings.jwt_issuer, &settings.jwt_audience)?;
        let hasher = Arc::new(BcryptHasher::new(
            settings.bcrypt_cost,
            settings.password_pepper.as_deref(),
        ));
        Ok(Self {
            store,
            audit: AuditWriter::new(clock.clone()),
            outbox: Outbox::new(clock.clone()),
            clock,
            codec,
            hasher,
            settings,
            courier: Arc::new(NullCourier),
            decoy_hash: OnceLock::new(),
        })
    }

    /// Swap the key derivation function.
    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self.decoy_hash = OnceLock::new();
        self
    }

    /// Route reset and verification bearers to a transport.
    pub fn with_courier(mut self, courier: Arc<dyn Courier>) -> Self {
        self.courier = courier;
        self
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Hash a password on a blocking thread.
    pub async fn hash_password(&self, plain: &str) -> CoreResult<String> {
        let hasher = self.hasher.clone();
        let plain = plain.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| CoreError::internal(format!("Password hashing task failed: {e}")))?
    }

    pub(super) async fn verify_password(&self, plain: &str, hash: &str) -> CoreResult<bool> {
        let hasher = self.hasher.clone();
        let (plain, hash) = (plain.to_string(), hash.to_string());
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .map_err(|e| CoreError::internal(format!("Password verification task failed: {e}")))?
    }

    /// Run a full hash check whose outcome is thrown away, so a miss costs
    /// the same as a wrong password.
    pub(super) async fn verify_decoy(&self, plain: &str) -> CoreResult<()> {
        let hash = match self.decoy_hash.get() {
            Some(hash) => hash.clone(),
            None => {
                let hash = self.hash_password(&new_token_id()).await?;
                self.decoy_hash.get_or_init(|| hash).clone()
            }
        };
        self.verify_password(plain, &hash).await?;
        Ok(())
    }

    /// Mint a bearer and persist its token row inside `uow`.
    pub(super) async fn issue(
        &self,
        uow: &dyn UnitOfWork,
        principal: PrincipalRef,
        purpose: TokenPurpose,
        abilities: Vec<String>,
        device: Option<String>,
        ttl: Duration,
    ) -> CoreResult<IssuedToken> {
        let now = self.clock.now();
        let expires_at = now + ttl;
        let token_id = new_token_id();
        let claims = Claims {
            sub: principal.subject(),
            kind: principal.kind,
            pid: principal.id,
            purpose,
            abilities: abilities.clone(),
            jti: token_id.clone(),
            device: device.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.codec.issuer().to_string(),
            aud: self.codec.audience().to_string(),
        };
        let bearer = self.codec.encode(&claims)?;

        uow.tokens()
            .create(TokenModel {
                token_id: token_id
                    .parse()
                    .map_err(|_| CoreError::internal("token id does not fit its column"))?,
                token_hash: digest(&bearer),
                principal,
                purpose,
                abilities,
                device,
                issued_at: now,
                expires_at,
                last_used_at: None,
                revoked: false,
            })
            .await?;

        Ok(IssuedToken {
            bearer,
            token_id,
            expires_at,
        })
    }

    /// Check a bearer's signature, claims and persistent row.
    pub(super) async fn authenticate(
        &self,
        uow: &dyn UnitOfWork,
        bearer: &str,
        purpose: TokenPurpose,
    ) -> CoreResult<(Claims, TokenModel)> {
        let claims = self.codec.decode(bearer)?;
        let principal = claims.principal()?;
        if claims.purpose != purpose {
            return Err(CoreError::InvalidPurpose);
        }
        let now = self.clock.now();
        if claims.is_early_at(now) {
            return Err(CoreError::Unauthenticated("token is not yet valid".to_string()));
        }
        if claims.is_expired_at(now) {
            return Err(CoreError::TokenExpired);
        }

        let row = uow
            .tokens()
            .find_by_id(&claims.jti)
            .await?
            .ok_or(CoreError::TokenRevoked)?;
        if row.token_hash != digest(bearer) {
            return Err(CoreError::TokenMismatch);
        }
        if row.revoked {
            return Err(CoreError::TokenRevoked);
        }
        if now >= row.expires_at {
            return Err(CoreError::TokenExpired);
        }
        if row.principal != principal {
            return Err(CoreError::TokenMismatch);
        }
        if row.purpose != purpose {
            return Err(CoreError::InvalidPurpose);
        }
        Ok((claims, row))
    }

    /// Authenticate a single-use bearer and consume it.
    pub(super) async fn consume(
        &self,
        uow: &dyn UnitOfWork,
        bearer: &str,
        purpose: TokenPurpose,
        ability: &str,
    ) -> CoreResult<TokenModel> {
        let (claims, row) = self.authenticate(uow, bearer, purpose).await?;
        if !has_ability(&row.abilities, ability) {
            return Err(CoreError::InvalidPurpose);
        }
        if !uow.tokens().revoke_if_live(&claims.jti, self.clock.now()).await? {
            return Err(CoreError::TokenRevoked);
        }
        Ok(row)
    }

    pub(super) async fn load_active(
        &self,
        uow: &dyn UnitOfWork,
        principal: PrincipalRef,
    ) -> CoreResult<PrincipalRecord> {
        let record = uow
            .principals()
            .find_by_ref(principal)
            .await?
            .ok_or(CoreError::PrincipalNotFound)?;
        ensure_active(record.status())?;
        Ok(record)
    }

    /// Public view of the session's principal.
    #[instrument(skip_all, fields(principal = %session.principal))]
    pub async fn me(&self, ctx: &RequestContext, session: &Session) -> CoreResult<PrincipalView> {
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let record = uow
                .principals()
                .find_by_ref(session.principal)
                .await?
                .ok_or(CoreError::PrincipalNotFound)?;
            uow.rollback().await?;
            Ok(record.view())
        })
        .await
    }
}

pub(super) fn ensure_active(status: PrincipalStatus) -> CoreResult<()> {
    match status {
        PrincipalStatus::Active => Ok(()),
        PrincipalStatus::Suspended => Err(CoreError::Suspended),
        PrincipalStatus::Inactive => Err(CoreError::Inactive),
    }
}

/// 128 random bits, base-16.
fn new_token_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest of a bearer as stored in the token row.
pub(super) fn digest(bearer: &str) -> String {
    blake3::hash(bearer.as_bytes()).to_hex().to_string()
}
