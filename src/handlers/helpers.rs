use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error as ThisError;

const MIN_PASSWORD_LENGTH: usize = 8;
const SPECIAL_CHARS: &[char] = &['!', '@', '#', '$', '%', '^', '&', '*'];

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum PasswordPolicyError {
    #[error("password must be at least 8 characters long")]
    TooShort,
    #[error("password must contain at least one number")]
    MissingNumber,
    #[error("password must contain at least one special character")]
    MissingSpecial,
    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("password must contain at least one lowercase letter")]
    MissingLowercase,
}

/// Check `password` against the account password policy. The first
/// failing rule is reported.
pub fn validate_password(password: &str) -> Result<(), PasswordPolicyError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordPolicyError::MissingNumber);
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(&c)) {
        return Err(PasswordPolicyError::MissingSpecial);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordPolicyError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordPolicyError::MissingLowercase);
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
