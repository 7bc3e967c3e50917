//! Request extractors shared by the HTTP handlers.

pub mod auth;

pub use auth::{AuthUser, MaybeAuthUser};
