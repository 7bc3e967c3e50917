//! Password hashing with Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::{AppError, AppResult};

/// Salted, cost-tunable one-way hashing. Hashes are PHC strings that carry
/// their own parameters, so raising the cost never invalidates stored hashes.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl CredentialHasher {
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Build from memory (KiB), iteration and lane costs.
    pub fn from_costs(memory_kib: u32, iterations: u32, parallelism: u32) -> AppResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AppError::Config(format!("argon2 params: {}", e)))?;
        Ok(Self::new(params))
    }

    pub fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
            .to_string();
        Ok(hash)
    }

    /// Mismatch is `Ok(false)`; a stored hash that does not parse is an error.
    pub fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("parse hash: {}", e)))?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> CredentialHasher {
    CredentialHasher::from_costs(1024, 1, 1).expect("cheap argon2 params")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash("Secur3!").unwrap();
        assert!(hasher.verify("Secur3!", &hash).unwrap());
        assert!(!hasher.verify("Secur3?", &hash).unwrap());
        assert!(!hasher.verify("", &hash).unwrap());
    }

    #[test]
    fn hash_never_contains_plaintext_and_is_salted() {
        let hasher = fast_hasher();
        let a = hasher.hash("SecureP@ss123").unwrap();
        let b = hasher.hash("SecureP@ss123").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert!(!a.contains("SecureP@ss123"));
        assert_ne!(a, b);
    }

    #[test]
    fn verifies_hashes_made_with_other_costs() {
        let old = CredentialHasher::from_costs(2048, 2, 1).unwrap().hash("a1!bcd").unwrap();
        assert!(fast_hasher().verify("a1!bcd", &old).unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(fast_hasher().verify("a1!bcd", "not-a-phc-string").is_err());
    }

    #[test]
    fn invalid_costs_are_a_config_error() {
        assert!(matches!(
            CredentialHasher::from_costs(1, 0, 0),
            Err(AppError::Config(_))
        ));
    }
}
