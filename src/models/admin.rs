//! Admin roles, payloads and the public admin view.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::AdminRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "super_admin",
            AdminRole::Admin => "admin",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(AdminRole::SuperAdmin),
            "admin" => Ok(AdminRole::Admin),
            other => Err(format!("unknown admin role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: AdminRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminView {
    /// Rows with a role this build does not know are reported, not guessed.
    pub fn try_from_row(row: &AdminRow) -> Result<Self, String> {
        Ok(Self {
            id: row.id,
            username: row.username.clone(),
            email: row.email.clone(),
            role: row.role.parse()?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Body of `POST /api/admin`. Every field is required.
#[derive(Clone, Deserialize, Validate)]
pub struct CreateAdminRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    pub role: AdminRole,
}

impl fmt::Debug for CreateAdminRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateAdminRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct AdminSigninRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for AdminSigninRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSigninRequest")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAuthResponse {
    pub token: String,
    pub admin: AdminView,
}
