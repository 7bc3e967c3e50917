//! Request, response and public-view models for users and admins.

pub mod admin;
pub mod user;

pub use admin::*;
pub use user::*;
