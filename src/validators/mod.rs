//! Input sanitizers: email shape, password strength, username safety and
//! injection signatures. Every check here is a pure function of its input.

mod email;
mod password;
mod security;

pub use email::{is_valid_email, normalize_email};
pub use password::{
    is_strong_password, validate_password_strength, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH,
};
pub use security::{
    contains_injection, detect_html_injection, detect_sql_injection, is_safe_string,
    is_safe_username, validate_username, USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH,
};

/// Outcome of a multi-rule check: valid when no rule produced a reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub reasons: Vec<String>,
}

impl CheckReport {
    pub fn is_valid(&self) -> bool {
        self.reasons.is_empty()
    }

    fn require(&mut self, ok: bool, reason: impl Into<String>) {
        if !ok {
            self.reasons.push(reason.into());
        }
    }
}
