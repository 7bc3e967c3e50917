//! The hasher and token issuer, built once at startup and shared by handlers.

use crate::config::Config;
use crate::error::{AppError, AppResult};

use super::jwt::TokenIssuer;
use super::password::CredentialHasher;

#[derive(Clone)]
pub struct Credentials {
    hasher: CredentialHasher,
    tokens: TokenIssuer,
}

impl Credentials {
    pub fn new(hasher: CredentialHasher, tokens: TokenIssuer) -> Self {
        Self { hasher, tokens }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let hasher = CredentialHasher::from_costs(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
        )?;
        let tokens = TokenIssuer::new(
            &config.jwt_secret,
            config.jwt_algorithm,
            config.jwt_expiration_minutes,
        )?;
        Ok(Self::new(hasher, tokens))
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Hash on the blocking pool so slow hashing never stalls other requests.
    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash task: {}", e)))?
    }

    pub async fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("verify task: {}", e)))?
    }
}

#[cfg(test)]
pub(crate) fn test_credentials() -> Credentials {
    let tokens = TokenIssuer::new(
        "test-jwt-secret-min-32-chars!!!!",
        jsonwebtoken::Algorithm::HS256,
        60,
    )
    .expect("test token issuer");
    Credentials::new(super::password::fast_hasher(), tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashing_runs_off_the_async_thread() {
        let credentials = test_credentials();
        let hash = credentials.hash_password("Secur3!").await.unwrap();
        assert!(credentials.verify_password("Secur3!", &hash).await.unwrap());
        assert!(!credentials.verify_password("Wrong1!", &hash).await.unwrap());
    }

    #[test]
    fn builds_from_config() {
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some("a-very-long-test-secret-of-at-least-32-bytes".to_string()),
            "JWT_ALGORITHM" => Some("HS384".to_string()),
            "JWT_EXPIRATION_MINUTES" => Some("15".to_string()),
            "PASSWORD_HASH_MEMORY_KIB" => Some("1024".to_string()),
            "PASSWORD_HASH_ITERATIONS" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();
        let credentials = Credentials::from_config(&config).unwrap();
        assert_eq!(credentials.tokens().ttl(), chrono::Duration::minutes(15));
    }
}
