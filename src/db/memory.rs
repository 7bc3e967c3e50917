//! In-process account store for tests and `DATABASE_URL=memory://` runs.
//! Uniqueness is checked and the row inserted under one write lock, which
//! plays the role of the table's unique constraints.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::repositories::{
    AccountStore, AdminRow, NewAdmin, NewUser, UserChanges, UserRow, EMAIL_REGISTERED,
    USERNAME_TAKEN,
};

#[derive(Default)]
struct Tables {
    users: Vec<UserRow>,
    admins: Vec<AdminRow>,
}

#[derive(Default)]
pub struct MemoryAccountStore {
    tables: RwLock<Tables>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

fn conflict(message: &str) -> AppError {
    AppError::Conflict(message.to_string())
}

fn user_conflict(
    users: &[UserRow],
    skip: Option<Uuid>,
    username: Option<&str>,
    email: Option<&str>,
) -> Option<AppError> {
    let others = || users.iter().filter(move |u| Some(u.id) != skip);
    if let Some(username) = username {
        if others().any(|u| u.username.as_deref() == Some(username)) {
            return Some(conflict(USERNAME_TAKEN));
        }
    }
    if let Some(email) = email {
        if others().any(|u| u.email == email) {
            return Some(conflict(EMAIL_REGISTERED));
        }
    }
    None
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn user_find_by_id(&self, id: Uuid) -> AppResult<Option<UserRow>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_find_by_email(&self, email: &str) -> AppResult<Option<UserRow>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn user_find_by_username(&self, username: &str) -> AppResult<Option<UserRow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn user_list(&self) -> AppResult<Vec<UserRow>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn user_insert(&self, user: NewUser) -> AppResult<UserRow> {
        let mut tables = self.tables.write().await;
        if let Some(err) = user_conflict(
            &tables.users,
            None,
            user.username.as_deref(),
            Some(&user.email),
        ) {
            return Err(err);
        }
        let now = Utc::now();
        let row = UserRow {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_active: user.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn user_update(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<UserRow>> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(err) = user_conflict(
            &tables.users,
            Some(id),
            changes.username.as_deref(),
            changes.email.as_deref(),
        ) {
            return Err(err);
        }
        let user = &mut tables.users[index];
        if let Some(username) = changes.username {
            user.username = Some(username);
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn user_delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        Ok(tables.users.len() < before)
    }

    async fn admin_find_by_username(&self, username: &str) -> AppResult<Option<AdminRow>> {
        let tables = self.tables.read().await;
        Ok(tables.admins.iter().find(|a| a.username == username).cloned())
    }

    async fn admin_find_by_email(&self, email: &str) -> AppResult<Option<AdminRow>> {
        let tables = self.tables.read().await;
        Ok(tables.admins.iter().find(|a| a.email == email).cloned())
    }

    async fn admin_insert(&self, admin: NewAdmin) -> AppResult<AdminRow> {
        let mut tables = self.tables.write().await;
        push_admin(&mut tables.admins, admin)
    }

    async fn admin_count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.admins.len() as i64)
    }

    async fn admin_insert_first(&self, admin: NewAdmin) -> AppResult<Option<AdminRow>> {
        let mut tables = self.tables.write().await;
        if !tables.admins.is_empty() {
            return Ok(None);
        }
        push_admin(&mut tables.admins, admin).map(Some)
    }
}

fn push_admin(admins: &mut Vec<AdminRow>, admin: NewAdmin) -> AppResult<AdminRow> {
    if admins.iter().any(|a| a.username == admin.username) {
        return Err(conflict(USERNAME_TAKEN));
    }
    if admins.iter().any(|a| a.email == admin.email) {
        return Err(conflict(EMAIL_REGISTERED));
    }
    let now = Utc::now();
    let row = AdminRow {
        id: Uuid::new_v4(),
        username: admin.username,
        email: admin.email,
        password_hash: admin.password_hash,
        role: admin.role,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    admins.push(row.clone());
    Ok(row)
}
