//! JWT issue and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::MAX_JWT_EXPIRATION_MINUTES;
use crate::error::{AppError, AppResult};
use crate::models::AdminRole;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub username: Option<String>,
    pub email: String,
    /// Present only on admin tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<AdminRole>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role.is_some()
    }
}

/// Why a token was rejected. Only ever logged; callers see one unauthorized error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token could not be decoded")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token signature does not match")]
    InvalidSignature,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        debug!(reason = %err, "bearer token rejected");
        AppError::Auth("Invalid or expired token".to_string())
    }
}

/// Signs and verifies bearer tokens with one HMAC secret and a fixed lifetime.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, algorithm: Algorithm, ttl_minutes: i64) -> AppResult<Self> {
        if secret.is_empty() {
            return Err(AppError::Config("JWT secret is not set".to_string()));
        }
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AppError::Config(format!(
                "JWT algorithm {:?} is not an HMAC algorithm",
                algorithm
            )));
        }
        if !(1..=MAX_JWT_EXPIRATION_MINUTES).contains(&ttl_minutes) {
            return Err(AppError::Config(format!(
                "JWT lifetime must be between 1 and {MAX_JWT_EXPIRATION_MINUTES} minutes"
            )));
        }
        let ttl = Duration::try_minutes(ttl_minutes)
            .ok_or_else(|| AppError::Config("JWT lifetime out of range".to_string()))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, id: Uuid, username: Option<&str>, email: &str) -> AppResult<String> {
        self.sign(&self.claims_at(Utc::now(), id, username, email, None)?)
    }

    pub fn issue_for_admin(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
        role: AdminRole,
    ) -> AppResult<String> {
        self.sign(&self.claims_at(Utc::now(), id, Some(username), email, Some(role))?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    fn claims_at(
        &self,
        now: DateTime<Utc>,
        id: Uuid,
        username: Option<&str>,
        email: &str,
        role: Option<AdminRole>,
    ) -> AppResult<Claims> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Config("JWT expiry out of range".to_string()))?;
        Ok(Claims {
            id,
            username: username.map(str::to_string),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    fn sign(&self, claims: &Claims) -> AppResult<String> {
        let token = encode(&Header::new(self.algorithm), claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("jwt encode: {}", e)))?;
        Ok(token)
    }
}
