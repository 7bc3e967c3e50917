//! User CRUD on top of the account store.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::{checked_email, checked_username, AuthService};
use crate::db::{AccountStore, UserChanges};
use crate::error::{AppError, AppResult};
use crate::models::{SignupRequest, UpdateUserRequest, UserView};

fn not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn AccountStore>,
    auth: AuthService,
}

impl UserService {
    pub fn new(store: Arc<dyn AccountStore>, auth: AuthService) -> Self {
        Self { store, auth }
    }

    pub async fn list(&self) -> AppResult<Vec<UserView>> {
        let rows = self.store.user_list().await?;
        Ok(rows.into_iter().map(UserView::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<UserView> {
        let row = self.store.user_find_by_id(id).await?.ok_or_else(not_found)?;
        Ok(UserView::from(row))
    }

    /// Same validation and uniqueness rules as signup, without a token.
    #[instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn create(&self, input: SignupRequest) -> AppResult<UserView> {
        let row = self.auth.register(input).await?;
        Ok(UserView::from(row))
    }

    /// Apply the fields present in `input`. Duplicate username or email
    /// surfaces as a conflict from the store.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateUserRequest) -> AppResult<UserView> {
        let changes = UserChanges {
            username: input.username.as_deref().map(checked_username).transpose()?,
            email: input.email.as_deref().map(checked_email).transpose()?,
            is_active: input.is_active,
        };
        let row = self
            .store
            .user_update(id, changes)
            .await?
            .ok_or_else(not_found)?;
        info!(user_id = %row.id, "user updated");
        Ok(UserView::from(row))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.user_delete(id).await? {
            return Err(not_found());
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}
