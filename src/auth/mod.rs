//! Authentication: password hashing, JWT, signup and signin.

mod credentials;
mod handlers;
mod jwt;
mod password;
mod service;

pub use credentials::Credentials;
pub use handlers::{signin, signup};
pub use jwt::{Claims, TokenError, TokenIssuer};
pub use password::CredentialHasher;
pub use service::AuthService;

pub(crate) use service::{checked_email, checked_password, checked_username, non_blank};

#[cfg(test)]
pub(crate) use credentials::test_credentials;
