//! HTTP request handlers.

pub mod admins;
pub mod http;
pub mod json;
pub mod users;

pub use http::*;
pub use json::AppJson;
