//! Auth HTTP handlers: signup, signin.

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::handlers::json::AppJson;
use crate::models::{AuthResponse, SigninRequest, SignupRequest};

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    AppJson(body): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let res = state.auth_service().signup(body).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// POST /api/auth/signin
pub async fn signin(
    State(state): State<AppState>,
    AppJson(body): AppJson<SigninRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let res = state.auth_service().signin(body).await?;
    Ok(Json(res))
}
