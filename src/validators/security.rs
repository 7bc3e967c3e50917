//! Username safety and injection-signature detection.

use std::sync::LazyLock;

use regex::RegexSet;

use super::CheckReport;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 30;

static SQL_INJECTION: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\b(alter|create|delete|drop|exec(ute)?|insert|select|union|update)\b",
        r"(?i)\b(and|or)\b.*(=|<|>)",
        r"(--|#|/\*|\*/)",
        r"(?i)\b(script|javascript|vbscript|onload|onerror|onclick)\b",
        r"(?i)(char\(|ascii\(|substring\()",
        r"(?i)\b(xp_|sp_)\w+",
    ])
    .expect("sql injection patterns")
});

static HTML_INJECTION: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)<script[^>]*>.*?</script>",
        r"(?i)<iframe[^>]*>.*?</iframe>",
        r"(?i)<object[^>]*>.*?</object>",
        r"(?i)<embed[^>]*>.*?</embed>",
        r"(?i)<form[^>]*>.*?</form>",
        r"(?i)javascript:",
        r"(?i)vbscript:",
        r"(?i)onload=",
        r"(?i)onerror=",
        r"(?i)onclick=",
        r"(?i)onmouseover=",
    ])
    .expect("html injection patterns")
});

pub fn detect_sql_injection(value: &str) -> bool {
    SQL_INJECTION.is_match(value)
}

pub fn detect_html_injection(value: &str) -> bool {
    HTML_INJECTION.is_match(value)
}

/// True when either the SQL or the HTML/script signatures match.
pub fn contains_injection(value: &str) -> bool {
    detect_sql_injection(value) || detect_html_injection(value)
}

/// Non-blank and free of injection signatures.
pub fn is_safe_string(value: &str) -> bool {
    !value.trim().is_empty() && !contains_injection(value)
}

/// Username rules: 3-30 characters from `[A-Za-z0-9._]`, not only dots or
/// only underscores, and no injection signatures.
pub fn validate_username(username: &str) -> CheckReport {
    let len = username.chars().count();
    let mut report = CheckReport::default();

    report.require(
        len >= USERNAME_MIN_LENGTH,
        format!("Username must be at least {USERNAME_MIN_LENGTH} characters long"),
    );
    report.require(
        len <= USERNAME_MAX_LENGTH,
        format!("Username must be no more than {USERNAME_MAX_LENGTH} characters long"),
    );
    report.require(
        !username.is_empty()
            && username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_'),
        "Username can only contain letters, numbers, dots, and underscores",
    );
    report.require(
        !username.chars().any(char::is_whitespace),
        "Username cannot contain spaces",
    );
    report.require(!username.trim().is_empty(), "Username cannot be empty");
    report.require(
        username.is_empty() || !username.chars().all(|c| c == '.'),
        "Username cannot consist only of dots",
    );
    report.require(
        username.is_empty() || !username.chars().all(|c| c == '_'),
        "Username cannot consist only of underscores",
    );
    report.require(
        !contains_injection(username),
        "Username contains potentially dangerous content",
    );

    report
}

pub fn is_safe_username(username: &str) -> bool {
    validate_username(username).is_valid()
}
