//! User and admin account service with JWT authentication.
//!
//! The credential path (password hashing, token issuance and verification,
//! field-level input validation) lives in [`auth`] and [`validators`];
//! persistence sits behind [`db::AccountStore`].

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod validators;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use handlers::{admins, http, users};
use tower_http::cors::CorsLayer;

/// Build the API router (health, auth, users, admin). Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let auth_routes = axum::Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin));

    let user_routes = axum::Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        );

    let admin_routes = axum::Router::new()
        .route("/", post(admins::create_admin))
        .route("/signin", post(admins::admin_signin));

    let api = axum::Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/admin", admin_routes)
        .route("/me", get(users::me));

    axum::Router::new()
        .route("/health", get(http::health))
        .nest("/api", api)
        .with_state(state)
}

/// CORS for the configured origins; origins that are not valid header values are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
