//! Auth application service: signup and signin.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::db::{AccountStore, NewUser, UserRow, EMAIL_REGISTERED, USERNAME_TAKEN};
use crate::error::{AppError, AppResult, ValidationErrors};
use crate::models::{AuthResponse, SigninRequest, SignupRequest, UserView};
use crate::validators::{normalize_email, validate_password_strength, validate_username};

use super::credentials::Credentials;

/// Orchestrates sanitizers, the account store, the hasher and the token
/// issuer. Every check runs before anything is written.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    credentials: Credentials,
}

/// `None` for absent or blank input, otherwise the trimmed value.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn checked_email(raw: &str) -> AppResult<String> {
    normalize_email(raw).ok_or_else(|| AppError::validation("email", "Invalid email format"))
}

pub(crate) fn checked_username(raw: &str) -> AppResult<String> {
    let username = raw.trim();
    let report = validate_username(username);
    if !report.is_valid() {
        return Err(ValidationErrors::for_field("username", report.reasons).into());
    }
    Ok(username.to_string())
}

pub(crate) fn checked_password(password: &str) -> AppResult<()> {
    let report = validate_password_strength(password);
    if !report.is_valid() {
        return Err(ValidationErrors::for_field("password", report.reasons).into());
    }
    Ok(())
}

impl AuthService {
    pub fn new(store: Arc<dyn AccountStore>, credentials: Credentials) -> Self {
        Self { store, credentials }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Create an account and sign the caller in. Self-service accounts always
    /// start active; only an admin creating a user may set `is_active`.
    #[instrument(skip(self, input), fields(email = ?input.email, username = ?input.username))]
    pub async fn signup(&self, input: SignupRequest) -> AppResult<AuthResponse> {
        let input = SignupRequest {
            is_active: None,
            ..input
        };
        let user = self.register(input).await?;
        let token = self
            .credentials
            .tokens()
            .issue(user.id, user.username.as_deref(), &user.email)?;
        Ok(AuthResponse {
            token,
            user: UserView::from(user),
        })
    }

    /// Validate, check uniqueness, hash and persist a new account.
    pub async fn register(&self, input: SignupRequest) -> AppResult<UserRow> {
        let email = non_blank(input.email.as_deref())
            .ok_or_else(|| AppError::validation("email", "Email is required"))?;
        let email = checked_email(email)?;

        let username = match non_blank(input.username.as_deref()) {
            Some(raw) => Some(checked_username(raw)?),
            // whitespace-only is a bad username, not an absent one
            None if input.username.as_deref().is_some_and(|u| !u.is_empty()) => {
                Some(checked_username("")?)
            }
            None => None,
        };

        if let Some(username) = &username {
            if self.store.user_find_by_username(username).await?.is_some() {
                return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
            }
        }
        if self.store.user_find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(EMAIL_REGISTERED.to_string()));
        }

        checked_password(&input.password)?;

        let password_hash = self.credentials.hash_password(&input.password).await?;
        // the unique constraints decide any race the lookups above missed
        let user = self
            .store
            .user_insert(NewUser {
                username,
                email,
                password_hash,
                is_active: input.is_active.unwrap_or(true),
            })
            .await?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Authenticate by email (preferred when both are given) or username.
    #[instrument(skip(self, input), fields(email = ?input.email, username = ?input.username))]
    pub async fn signin(&self, input: SigninRequest) -> AppResult<AuthResponse> {
        let email = non_blank(input.email.as_deref());
        let username = non_blank(input.username.as_deref());
        if email.is_none() && username.is_none() {
            return Err(AppError::validation(
                "email",
                "Email or username is required for login",
            ));
        }
        if input.password.is_empty() {
            return Err(AppError::validation("password", "Password is required for login"));
        }

        let found = match (email, username) {
            (Some(email), _) => {
                let email = checked_email(email)?;
                self.store.user_find_by_email(&email).await?
            }
            (None, Some(username)) => {
                let username = checked_username(username)?;
                self.store.user_find_by_username(&username).await?
            }
            (None, None) => None,
        };
        let user = found.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !self
            .credentials
            .verify_password(&input.password, &user.password_hash)
            .await?
        {
            warn!(user_id = %user.id, "signin rejected: bad password");
            return Err(AppError::Auth("Invalid credentials".to_string()));
        }
        if !user.is_active {
            warn!(user_id = %user.id, "signin rejected: account disabled");
            return Err(AppError::Auth("Invalid credentials".to_string()));
        }

        let token = self
            .credentials
            .tokens()
            .issue(user.id, user.username.as_deref(), &user.email)?;
        info!(user_id = %user.id, "user signed in");
        Ok(AuthResponse {
            token,
            user: UserView::from(user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::test_credentials;
    use crate::db::{MemoryAccountStore, UserChanges};

    fn service() -> (AuthService, Arc<MemoryAccountStore>) {
        let store = Arc::new(MemoryAccountStore::new());
        (AuthService::new(store.clone(), test_credentials()), store)
    }

    fn signup_req(username: Option<&str>, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: username.map(str::to_string),
            email: Some(email.to_string()),
            password: password.to_string(),
            is_active: None,
        }
    }

    fn signin_req(email: Option<&str>, username: Option<&str>, password: &str) -> SigninRequest {
        SigninRequest {
            email: email.map(str::to_string),
            username: username.map(str::to_string),
            password: password.to_string(),
        }
    }

    fn validation(err: AppError) -> ValidationErrors {
        match err {
            AppError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn signup_returns_token_for_new_account() {
        let (auth, store) = service();
        let res = auth
            .signup(signup_req(Some("john_doe"), "john@x.com", "Secur3!"))
            .await
            .unwrap();

        let claims = auth.credentials().tokens().verify(&res.token).unwrap();
        assert_eq!(claims.username.as_deref(), Some("john_doe"));
        assert_eq!(claims.id, res.user.id);
        assert!(res.user.is_active);
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn signup_trims_username_and_lowercases_email() {
        let (auth, _) = service();
        let res = auth
            .signup(signup_req(Some("  john_doe  "), " John@X.com ", "Secur3!"))
            .await
            .unwrap();
        assert_eq!(res.user.username.as_deref(), Some("john_doe"));
        assert_eq!(res.user.email, "john@x.com");
    }

    #[tokio::test]
    async fn weak_password_is_rejected_before_persistence() {
        let (auth, store) = service();
        let err = auth
            .signup(signup_req(Some("john_doe"), "john@x.com", "short"))
            .await
            .unwrap_err();
        let errors = validation(err);
        assert!(errors.mentions("password", "at least 6 characters"));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn missing_or_bad_email_is_reported_first() {
        let (auth, _) = service();
        let mut req = signup_req(Some("x"), "", "short");
        req.email = None;
        let errors = validation(auth.signup(req).await.unwrap_err());
        assert!(errors.mentions("email", "required"));

        let errors = validation(
            auth.signup(signup_req(Some("x"), "not-an-email", "short"))
                .await
                .unwrap_err(),
        );
        assert!(errors.mentions("email", "invalid email"));
    }

    #[tokio::test]
    async fn unsafe_username_lists_every_reason() {
        let (auth, store) = service();
        let errors = validation(
            auth.signup(signup_req(Some("a b"), "a@x.com", "Secur3!"))
                .await
                .unwrap_err(),
        );
        assert!(errors.mentions("username", "letters, numbers"));
        assert!(errors.mentions("username", "spaces"));
        assert!(errors.fields().all(|e| e.field == "username"));

        let errors = validation(
            auth.signup(signup_req(Some("   "), "a@x.com", "Secur3!"))
                .await
                .unwrap_err(),
        );
        assert!(errors.mentions("username", "cannot be empty"));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn username_is_optional() {
        let (auth, _) = service();
        let res = auth
            .signup(signup_req(None, "anon@x.com", "Secur3!"))
            .await
            .unwrap();
        assert_eq!(res.user.username, None);
        let claims = auth.credentials().tokens().verify(&res.token).unwrap();
        assert_eq!(claims.username, None);
    }

    #[tokio::test]
    async fn duplicates_conflict_in_order() {
        let (auth, _) = service();
        auth.signup(signup_req(Some("john_doe"), "john@x.com", "Secur3!"))
            .await
            .unwrap();

        let err = auth
            .signup(signup_req(Some("john_doe"), "other@x.com", "Secur3!"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == USERNAME_TAKEN));

        let err = auth
            .signup(signup_req(Some("jane"), "john@x.com", "Secur3!"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == EMAIL_REGISTERED));

        // uniqueness is checked before password strength
        let err = auth
            .signup(signup_req(Some("john_doe"), "z@x.com", "weak"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn concurrent_signups_with_same_username_have_one_winner() {
        let (auth, store) = service();
        let a = auth.signup(signup_req(Some("racer"), "one@x.com", "Secur3!"));
        let b = auth.signup(signup_req(Some("racer"), "two@x.com", "Secur3!"));
        let (a, b) = tokio::join!(a, b);

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict(_)))));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn signin_by_email_or_username() {
        let (auth, _) = service();
        let created = auth
            .signup(signup_req(Some("john_doe"), "john@x.com", "Secur3!"))
            .await
            .unwrap();

        let by_email = auth
            .signin(signin_req(Some("john@x.com"), None, "Secur3!"))
            .await
            .unwrap();
        assert_eq!(by_email.user.id, created.user.id);

        let by_name = auth
            .signin(signin_req(None, Some("john_doe"), "Secur3!"))
            .await
            .unwrap();
        assert_eq!(by_name.user.id, created.user.id);
    }

    #[tokio::test]
    async fn signin_with_wrong_password_is_unauthorized() {
        let (auth, _) = service();
        auth.signup(signup_req(None, "john@x.com", "Secur3!"))
            .await
            .unwrap();
        let err = auth
            .signin(signin_req(Some("john@x.com"), None, "Wrong1!"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(ref m) if m == "Invalid credentials"));
    }

    #[tokio::test]
    async fn signin_unknown_account_is_not_found() {
        let (auth, _) = service();
        let err = auth
            .signin(signin_req(Some("ghost@x.com"), None, "Secur3!"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn signin_email_takes_precedence_over_username() {
        let (auth, _) = service();
        let john = auth
            .signup(signup_req(Some("john_doe"), "john@x.com", "Secur3!"))
            .await
            .unwrap();
        auth.signup(signup_req(Some("jane"), "jane@x.com", "Jan3!pw"))
            .await
            .unwrap();

        let res = auth
            .signin(signin_req(Some("john@x.com"), Some("jane"), "Secur3!"))
            .await
            .unwrap();
        assert_eq!(res.user.id, john.user.id);
    }

    #[tokio::test]
    async fn signin_validates_only_the_identifier_supplied() {
        let (auth, _) = service();
        auth.signup(signup_req(Some("john_doe"), "john@x.com", "Secur3!"))
            .await
            .unwrap();

        // the unused username would fail validation but is never looked at
        let res = auth
            .signin(signin_req(Some("john@x.com"), Some("<script>"), "Secur3!"))
            .await;
        assert!(res.is_ok());

        let errors = validation(
            auth.signin(signin_req(None, Some("bad name"), "Secur3!"))
                .await
                .unwrap_err(),
        );
        assert!(errors.fields().all(|e| e.field == "username"));
    }

    #[tokio::test]
    async fn signin_requires_identifier_and_password() {
        let (auth, _) = service();
        let errors = validation(
            auth.signin(signin_req(None, Some("  "), "Secur3!"))
                .await
                .unwrap_err(),
        );
        assert!(errors.mentions("email", "email or username is required"));

        let errors = validation(
            auth.signin(signin_req(Some("john@x.com"), None, ""))
                .await
                .unwrap_err(),
        );
        assert!(errors.mentions("password", "required"));
    }

    #[tokio::test]
    async fn signup_ignores_client_supplied_is_active() {
        let (auth, _) = service();
        let mut req = signup_req(None, "off@x.com", "Secur3!");
        req.is_active = Some(false);
        let res = auth.signup(req).await.unwrap();
        assert!(res.user.is_active);

        assert!(auth
            .signin(signin_req(Some("off@x.com"), None, "Secur3!"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn disabled_account_gets_the_same_answer_as_a_wrong_password() {
        let (auth, store) = service();
        let res = auth
            .signup(signup_req(None, "off@x.com", "Secur3!"))
            .await
            .unwrap();
        let changes = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        store.user_update(res.user.id, changes).await.unwrap();

        let disabled = auth
            .signin(signin_req(Some("off@x.com"), None, "Secur3!"))
            .await
            .unwrap_err();
        let wrong = auth
            .signin(signin_req(Some("off@x.com"), None, "Wr0ng!pw"))
            .await
            .unwrap_err();
        assert!(matches!(disabled, AppError::Auth(_)));
        assert_eq!(disabled.to_string(), wrong.to_string());
    }
}
