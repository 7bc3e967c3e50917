//! JSON body extractor whose rejections use the API error body.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json`, but a body that does not parse is a 400 with `details`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
