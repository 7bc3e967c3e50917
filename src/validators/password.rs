//! Password strength rules.

use super::CheckReport;

pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const PASSWORD_MAX_LENGTH: usize = 128;

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>_+-=[]\\;'/~`";

/// Checks length (in characters), letter, digit and special-character
/// presence, and absence of whitespace. Reasons are listed in that order.
pub fn validate_password_strength(password: &str) -> CheckReport {
    let len = password.chars().count();
    let mut report = CheckReport::default();

    report.require(
        len >= PASSWORD_MIN_LENGTH,
        format!("Password must be at least {PASSWORD_MIN_LENGTH} characters long"),
    );
    report.require(
        len <= PASSWORD_MAX_LENGTH,
        format!("Password must be no more than {PASSWORD_MAX_LENGTH} characters long"),
    );
    report.require(
        password.chars().any(|c| c.is_ascii_alphabetic()),
        "Password must contain at least one letter",
    );
    report.require(
        password.chars().any(|c| c.is_ascii_digit()),
        "Password must contain at least one number",
    );
    report.require(
        password.chars().any(|c| SPECIAL_CHARS.contains(c)),
        "Password must contain at least one special character",
    );
    report.require(
        !password.chars().any(char::is_whitespace),
        "Password cannot contain whitespace",
    );

    report
}

pub fn is_strong_password(password: &str) -> bool {
    validate_password_strength(password).is_valid()
}
