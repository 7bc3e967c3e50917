//! Repositories: users and admins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::DbPool;

pub const USERNAME_TAKEN: &str = "Username already taken";
pub const EMAIL_REGISTERED: &str = "Email already registered";

/// Persistence collaborator for accounts. Inserts and updates report a
/// uniqueness violation as [`AppError::Conflict`]; that is the authoritative
/// duplicate signal, whatever a prior lookup said.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn user_find_by_id(&self, id: Uuid) -> AppResult<Option<UserRow>>;
    async fn user_find_by_email(&self, email: &str) -> AppResult<Option<UserRow>>;
    async fn user_find_by_username(&self, username: &str) -> AppResult<Option<UserRow>>;
    async fn user_list(&self) -> AppResult<Vec<UserRow>>;
    async fn user_insert(&self, user: NewUser) -> AppResult<UserRow>;
    /// `None` when no user has this id.
    async fn user_update(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<UserRow>>;
    /// `false` when no user has this id.
    async fn user_delete(&self, id: Uuid) -> AppResult<bool>;

    async fn admin_find_by_username(&self, username: &str) -> AppResult<Option<AdminRow>>;
    async fn admin_find_by_email(&self, email: &str) -> AppResult<Option<AdminRow>>;
    async fn admin_insert(&self, admin: NewAdmin) -> AppResult<AdminRow>;
    async fn admin_count(&self) -> AppResult<i64>;
    /// Insert only while no admin exists yet; `None` once one does. Concurrent
    /// callers are serialized so at most one first admin is created.
    async fn admin_insert_first(&self, admin: NewAdmin) -> AppResult<Option<AdminRow>>;
}

// ---- User ----

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

// ---- Admin ----

#[derive(Debug, Clone, FromRow)]
pub struct AdminRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

// ---- PostgreSQL ----

const USER_COLUMNS: &str = "id, username, email, password_hash, is_active, created_at, updated_at";
const ADMIN_COLUMNS: &str =
    "id, username, email, password_hash, role, is_active, created_at, updated_at";

/// [`AccountStore`] over the `users` and `admins` tables.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: DbPool,
}

impl PgAccountStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Turns a unique-constraint violation into a conflict naming the field.
/// Constraint names come from `migrations/` (`*_username_key`, `*_email_key`).
fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some(c) if c.contains("username") => USERNAME_TAKEN,
                Some(c) if c.contains("email") => EMAIL_REGISTERED,
                _ => "Account already exists",
            };
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::Db(err)
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn user_find_by_id(&self, id: Uuid) -> AppResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn user_find_by_email(&self, email: &str) -> AppResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn user_find_by_username(&self, username: &str) -> AppResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn user_list(&self) -> AppResult<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn user_insert(&self, user: NewUser) -> AppResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(row)
    }

    async fn user_update(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(row)
    }

    async fn user_delete(&self, id: Uuid) -> AppResult<bool> {
        let r = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected() > 0)
    }

    async fn admin_find_by_username(&self, username: &str) -> AppResult<Option<AdminRow>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn admin_find_by_email(&self, email: &str) -> AppResult<Option<AdminRow>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn admin_insert(&self, admin: NewAdmin) -> AppResult<AdminRow> {
        let row = sqlx::query_as::<_, AdminRow>(&insert_admin_sql())
            .bind(&admin.username)
            .bind(&admin.email)
            .bind(&admin.password_hash)
            .bind(&admin.role)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)?;
        Ok(row)
    }

    async fn admin_count(&self) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn admin_insert_first(&self, admin: NewAdmin) -> AppResult<Option<AdminRow>> {
        let mut tx = self.pool.begin().await?;
        // blocks other inserts until commit; plain reads still go through
        sqlx::query("LOCK TABLE admins IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins")
            .fetch_one(&mut *tx)
            .await?;
        if count > 0 {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, AdminRow>(&insert_admin_sql())
            .bind(&admin.username)
            .bind(&admin.email)
            .bind(&admin.password_hash)
            .bind(&admin.role)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_unique_violation)?;
        tx.commit().await?;
        Ok(Some(row))
    }
}

fn insert_admin_sql() -> String {
    format!(
        r#"
        INSERT INTO admins (username, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        RETURNING {ADMIN_COLUMNS}
        "#
    )
}
