//! User HTTP handlers. Every route needs a bearer token; writes to another
//! account need an admin token.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::http::AppState;
use crate::handlers::json::AppJson;
use crate::middleware::auth::AuthUser;
use crate::models::{SignupRequest, UpdateUserRequest, UserView};

fn ensure_self_or_admin(caller: &AuthUser, id: Uuid) -> AppResult<()> {
    if caller.0.id == id || caller.0.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not allowed to modify this user".to_string()))
    }
}

/// GET /api/me
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserView>, AppError> {
    Ok(Json(state.user_service().get(claims.id).await?))
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> Result<Json<Vec<UserView>>, AppError> {
    Ok(Json(state.user_service().list().await?))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, AppError> {
    Ok(Json(state.user_service().get(id).await?))
}

/// POST /api/users (admin only)
pub async fn create_user(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(body): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    if !caller.0.is_admin() {
        return Err(AppError::Forbidden("Admin token required".to_string()));
    }
    let user = state.user_service().create(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<UpdateUserRequest>,
) -> Result<Json<UserView>, AppError> {
    ensure_self_or_admin(&caller, id)?;
    Ok(Json(state.user_service().update(id, body).await?))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ensure_self_or_admin(&caller, id)?;
    state.user_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
