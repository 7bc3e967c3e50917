//! Admin HTTP handlers.

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::handlers::json::AppJson;
use crate::middleware::MaybeAuthUser;
use crate::models::{AdminAuthResponse, AdminSigninRequest, AdminView, CreateAdminRequest};

/// POST /api/admin: super admin token, or none while no admin exists yet.
pub async fn create_admin(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    AppJson(body): AppJson<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AdminView>), AppError> {
    let admin = state.admin_service().create(caller.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

/// POST /api/admin/signin
pub async fn admin_signin(
    State(state): State<AppState>,
    AppJson(body): AppJson<AdminSigninRequest>,
) -> Result<Json<AdminAuthResponse>, AppError> {
    Ok(Json(state.admin_service().signin(body).await?))
}
