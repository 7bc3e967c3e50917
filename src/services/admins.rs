//! Admin accounts: creation and signin.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::{
    checked_email, checked_password, checked_username, non_blank, Claims, Credentials,
};
use crate::db::{AccountStore, AdminRow, NewAdmin, EMAIL_REGISTERED, USERNAME_TAKEN};
use crate::error::{AppError, AppResult, ValidationErrors};
use crate::models::{
    AdminAuthResponse, AdminRole, AdminSigninRequest, AdminView, CreateAdminRequest,
};

const SUPER_ADMIN_REQUIRED: &str = "Super admin token required";

fn view(row: &AdminRow) -> AppResult<AdminView> {
    AdminView::try_from_row(row).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn AccountStore>,
    credentials: Credentials,
}

impl AdminService {
    pub fn new(store: Arc<dyn AccountStore>, credentials: Credentials) -> Self {
        Self { store, credentials }
    }

    /// Create an admin. Needs a `super_admin` caller, except for the very first
    /// admin, which may be created anonymously and must be a `super_admin`.
    #[instrument(skip(self, caller, input), fields(username = %input.username, role = %input.role))]
    pub async fn create(
        &self,
        caller: Option<&Claims>,
        input: CreateAdminRequest,
    ) -> AppResult<AdminView> {
        let bootstrap = match caller {
            Some(claims) if claims.role == Some(AdminRole::SuperAdmin) => false,
            Some(claims) => {
                warn!(caller_id = %claims.id, "admin creation refused: not a super admin");
                return Err(AppError::Forbidden(SUPER_ADMIN_REQUIRED.to_string()));
            }
            None => {
                if self.store.admin_count().await? > 0 {
                    return Err(AppError::Auth(SUPER_ADMIN_REQUIRED.to_string()));
                }
                true
            }
        };

        input.validate().map_err(ValidationErrors::from)?;

        let username = non_blank(Some(input.username.as_str()))
            .ok_or_else(|| AppError::validation("username", "username is required"))?;
        let email = non_blank(Some(input.email.as_str()))
            .ok_or_else(|| AppError::validation("email", "email is required"))?;

        let email = checked_email(email)?;
        let username = checked_username(username)?;
        checked_password(&input.password)?;

        if self.store.admin_find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
        }
        if self.store.admin_find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(EMAIL_REGISTERED.to_string()));
        }

        if bootstrap && input.role != AdminRole::SuperAdmin {
            return Err(AppError::validation(
                "role",
                "The first admin must be a super_admin",
            ));
        }

        let password_hash = self.credentials.hash_password(&input.password).await?;
        let admin = NewAdmin {
            username,
            email,
            password_hash,
            role: input.role.as_str().to_string(),
        };
        let row = if bootstrap {
            // None: another anonymous request created the first admin meanwhile
            self.store
                .admin_insert_first(admin)
                .await?
                .ok_or_else(|| AppError::Auth(SUPER_ADMIN_REQUIRED.to_string()))?
        } else {
            self.store.admin_insert(admin).await?
        };

        info!(admin_id = %row.id, bootstrap, "admin created");
        view(&row)
    }

    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn signin(&self, input: AdminSigninRequest) -> AppResult<AdminAuthResponse> {
        let username = non_blank(Some(input.username.as_str()))
            .ok_or_else(|| AppError::validation("username", "Username is required for login"))?;
        if input.password.is_empty() {
            return Err(AppError::validation("password", "Password is required for login"));
        }
        let username = checked_username(username)?;

        let row = self
            .store
            .admin_find_by_username(&username)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

        if !self
            .credentials
            .verify_password(&input.password, &row.password_hash)
            .await?
        {
            warn!(admin_id = %row.id, "admin signin rejected: bad password");
            return Err(AppError::Auth("Invalid credentials".to_string()));
        }
        if !row.is_active {
            warn!(admin_id = %row.id, "admin signin rejected: account disabled");
            return Err(AppError::Auth("Invalid credentials".to_string()));
        }

        let admin = view(&row)?;
        let token = self.credentials.tokens().issue_for_admin(
            admin.id,
            &admin.username,
            &admin.email,
            admin.role,
        )?;
        info!(admin_id = %admin.id, "admin signed in");
        Ok(AdminAuthResponse { token, admin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_credentials;
    use crate::db::MemoryAccountStore;
    use uuid::Uuid;

    fn service() -> AdminService {
        AdminService::new(Arc::new(MemoryAccountStore::new()), test_credentials())
    }

    fn create_req(
        username: &str,
        email: &str,
        password: &str,
        role: AdminRole,
    ) -> CreateAdminRequest {
        CreateAdminRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        }
    }

    fn caller(role: Option<AdminRole>) -> Claims {
        Claims {
            id: Uuid::new_v4(),
            username: Some("caller".to_string()),
            email: "caller@lemon.test".to_string(),
            role,
            iat: 0,
            exp: 0,
        }
    }

    /// Service with its first super admin already created.
    async fn bootstrapped() -> AdminService {
        let admins = service();
        admins
            .create(
                None,
                create_req("chef", "chef@lemon.test", "Lem0n!pie", AdminRole::SuperAdmin),
            )
            .await
            .unwrap();
        admins
    }

    #[tokio::test]
    async fn first_admin_then_sign_in_with_role_claim() {
        let admins = service();
        let created = admins
            .create(
                None,
                create_req("chef", "chef@lemon.test", "Lem0n!pie", AdminRole::SuperAdmin),
            )
            .await
            .unwrap();
        assert_eq!(created.role, AdminRole::SuperAdmin);

        let res = admins
            .signin(AdminSigninRequest {
                username: "chef".to_string(),
                password: "Lem0n!pie".to_string(),
            })
            .await
            .unwrap();
        let claims = test_credentials().tokens().verify(&res.token).unwrap();
        assert_eq!(claims.id, created.id);
        assert_eq!(claims.role, Some(AdminRole::SuperAdmin));
    }

    #[tokio::test]
    async fn first_admin_must_be_super_admin() {
        let admins = service();
        let err = admins
            .create(
                None,
                create_req("chef", "chef@lemon.test", "Lem0n!pie", AdminRole::Admin),
            )
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.mentions("role", "super_admin"));
    }

    #[tokio::test]
    async fn later_admins_need_a_super_admin_caller() {
        let admins = bootstrapped().await;
        let req = || create_req("sous", "sous@lemon.test", "Lem0n!pie", AdminRole::SuperAdmin);

        assert!(matches!(
            admins.create(None, req()).await,
            Err(AppError::Auth(_))
        ));
        assert!(matches!(
            admins.create(Some(&caller(None)), req()).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            admins.create(Some(&caller(Some(AdminRole::Admin))), req()).await,
            Err(AppError::Forbidden(_))
        ));

        let created = admins
            .create(Some(&caller(Some(AdminRole::SuperAdmin))), req())
            .await
            .unwrap();
        assert_eq!(created.username, "sous");
    }

    #[tokio::test]
    async fn required_fields_are_reported_per_field() {
        let admins = service();
        let err = admins
            .create(None, create_req("", "", "", AdminRole::SuperAdmin))
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.mentions("username", "required"));
        assert!(errors.mentions("email", "required"));
        assert!(errors.mentions("password", "required"));
    }

    #[tokio::test]
    async fn weak_password_and_duplicates_are_rejected() {
        let admins = bootstrapped().await;
        let boss = caller(Some(AdminRole::SuperAdmin));
        assert!(matches!(
            admins
                .create(
                    Some(&boss),
                    create_req("sous", "sous@lemon.test", "weak", AdminRole::Admin)
                )
                .await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            admins
                .create(
                    Some(&boss),
                    create_req("chef", "other@lemon.test", "Lem0n!pie", AdminRole::Admin)
                )
                .await,
            Err(AppError::Conflict(ref m)) if m == USERNAME_TAKEN
        ));
        assert!(matches!(
            admins
                .create(
                    Some(&boss),
                    create_req("sous", "chef@lemon.test", "Lem0n!pie", AdminRole::Admin)
                )
                .await,
            Err(AppError::Conflict(ref m)) if m == EMAIL_REGISTERED
        ));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let admins = bootstrapped().await;
        let err = admins
            .signin(AdminSigninRequest {
                username: "chef".to_string(),
                password: "Lem0n!tart".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(ref m) if m == "Invalid credentials"));
    }
}
