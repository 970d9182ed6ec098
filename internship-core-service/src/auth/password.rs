use hmac::{Hmac, Mac};
use internship_core_api::{CoreError, CoreResult};
use sha2::Sha256;
use tracing::warn;

/// Key derivation used for stored password hashes.
///
/// Implementations are CPU-bound and are called from a blocking thread.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> CoreResult<String>;

    /// Constant-time comparison of `plain` against a stored hash.
    fn verify(&self, plain: &str, hash: &str) -> CoreResult<bool>;
}

/// bcrypt with an optional HMAC-SHA256 pepper applied before hashing.
pub struct BcryptHasher {
    cost: u32,
    pepper: Option<Vec<u8>>,
}

impl BcryptHasher {
    pub fn new(cost: u32, pepper: Option<&str>) -> Self {
        Self {
            cost,
            pepper: pepper.filter(|p| !p.is_empty()).map(|p| p.as_bytes().to_vec()),
        }
    }

    fn prepare(&self, plain: &str) -> CoreResult<String> {
        match &self.pepper {
            None => Ok(plain.to_string()),
            Some(pepper) => {
                let mut mac = Hmac::<Sha256>::new_from_slice(pepper)
                    .map_err(|e| CoreError::internal(format!("Invalid pepper: {e}")))?;
                mac.update(plain.as_bytes());
                Ok(hex::encode(mac.finalize().into_bytes()))
            }
        }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> CoreResult<String> {
        bcrypt::hash(self.prepare(plain)?, self.cost)
            .map_err(|e| CoreError::internal(format!("Failed to hash password: {e}")))
    }

    fn verify(&self, plain: &str, hash: &str) -> CoreResult<bool> {
        match bcrypt::verify(self.prepare(plain)?, hash) {
            Ok(matches) => Ok(matches),
            Err(e) => {
                warn!(error = %e, "Stored password hash is unreadable");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hasher = BcryptHasher::new(4, None);
        let hash = hasher.hash("Passw0rd!").unwrap();
        assert!(hasher.verify("Passw0rd!", &hash).unwrap());
        assert!(!hasher.verify("passw0rd!", &hash).unwrap());
    }

    #[test]
    fn test_pepper_changes_the_secret() {
        let peppered = BcryptHasher::new(4, Some("pepper"));
        let plain = BcryptHasher::new(4, None);
        let hash = peppered.hash("Passw0rd!").unwrap();
        assert!(peppered.verify("Passw0rd!", &hash).unwrap());
        assert!(!plain.verify("Passw0rd!", &hash).unwrap());
    }

    #[test]
    fn test_corrupt_hash_never_matches() {
        let hasher = BcryptHasher::new(4, None);
        assert!(!hasher.verify("anything", "not-a-bcrypt-hash").unwrap());
    }
}
