//! Auth extractor: bearer JWT to verified claims.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;

use crate::auth::Claims;
use crate::error::AppError;
use crate::handlers::http::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Extractor: claims of a valid, unexpired bearer token.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix(BEARER_PREFIX))
            .map(str::trim);
        let token = auth
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Auth("Missing or invalid Authorization header".to_string()))?;
        let claims = state.credentials().tokens().verify(token)?;
        Ok(AuthUser(claims))
    }
}

/// Extractor for routes that also serve anonymous callers. No `Authorization`
/// header gives `None`; a header that fails verification is still rejected.
#[derive(Clone, Debug)]
pub struct MaybeAuthUser(pub Option<Claims>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        Ok(MaybeAuthUser(Some(claims)))
    }
}
