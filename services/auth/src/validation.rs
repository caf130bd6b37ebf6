//! Input validation for provisioned accounts

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Reasons an account is refused at registration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Email must be at most 254 characters long")]
    EmailTooLong,
    #[error("Invalid email format")]
    MalformedEmail,
    #[error("Password must be between 8 and 128 characters long")]
    PasswordLength,
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingEmail);
    }

    if email.len() > 254 {
        return Err(ValidationError::EmailTooLong);
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email regex is valid")
    });

    if !regex.is_match(email) {
        return Err(ValidationError::MalformedEmail);
    }

    Ok(())
}

/// Validate password length; composition is left to the account owner
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if !(8..=128).contains(&length) {
        return Err(ValidationError::PasswordLength);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("alice@example.com"), Ok(()));
        assert_eq!(validate_email(""), Err(ValidationError::MissingEmail));
        assert_eq!(validate_email("alice"), Err(ValidationError::MalformedEmail));
        assert_eq!(validate_email("alice@host"), Err(ValidationError::MalformedEmail));

        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(validate_email(&long), Err(ValidationError::EmailTooLong));
    }

    #[test]
    fn test_validate_password() {
        assert_eq!(validate_password("12345678"), Ok(()));
        assert_eq!(validate_password("1234567"), Err(ValidationError::PasswordLength));
        assert_eq!(
            validate_password(&"x".repeat(129)),
            Err(ValidationError::PasswordLength)
        );
    }
}
