//! Email format checks. Any domain is accepted; deliverability is never probed.

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidateEmail;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

/// Permissive email check: the HTML5/RFC shape from `validator` first, then a
/// plain `local@domain.tld` fallback.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() {
        return false;
    }
    email.validate_email() || EMAIL_PATTERN.is_match(email)
}

/// Trimmed, lowercased form used for comparisons. `None` when the input is not an email.
pub fn normalize_email(email: &str) -> Option<String> {
    is_valid_email(email).then(|| email.trim().to_lowercase())
}
