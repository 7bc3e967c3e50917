//! Shared application state and the health probe.

use std::sync::Arc;

use axum::{http::StatusCode, Json};
use serde_json::json;

use crate::auth::{AuthService, Credentials};
use crate::db::AccountStore;
use crate::services::{AdminService, UserService};

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Credentials,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub admin_service: AdminService,
}

impl AppState {
    /// Wire every service to one store and one set of credentials.
    pub fn new(store: Arc<dyn AccountStore>, credentials: Credentials) -> Self {
        let auth_service = AuthService::new(store.clone(), credentials.clone());
        let user_service = UserService::new(store.clone(), auth_service.clone());
        let admin_service = AdminService::new(store, credentials.clone());
        Self {
            credentials,
            auth_service,
            user_service,
            admin_service,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
    pub fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }
    pub fn user_service(&self) -> &UserService {
        &self.user_service
    }
    pub fn admin_service(&self) -> &AdminService {
        &self.admin_service
    }
}

/// GET /health: liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "lemon-api" })),
    )
}
