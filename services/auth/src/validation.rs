//! Input validation utilities
//!
//! Rejects obviously malformed sign-up input before anything is created
//! remotely. The email check is a shape test only; the service has the final
//! say on which addresses it accepts.

use regex::Regex;
use std::sync::OnceLock;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username is required".to_string());
    }

    if username.chars().count() > 128 {
        return Err("Username must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    let length = password.chars().count();

    if length < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if length > 256 {
        return Err("Password must be at most 256 characters long".to_string());
    }

    Ok(())
}

/// Validate a complete sign-up form
pub fn validate_registration(email: &str, password: &str, username: &str) -> Result<(), String> {
    validate_email(email)?;
    validate_password(password)?;
    validate_username(username)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_registration() {
        assert!(validate_registration("alice@x.com", "pw123456", "alice").is_ok());
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(validate_email(""), Err("Email is required".to_string()));
        assert_eq!(
            validate_email("not-an-email"),
            Err("Invalid email format".to_string())
        );
        assert!(validate_email("alice@localhost").is_err());
        assert!(validate_email("two words@x.com").is_err());
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_email_accepts_unusual_addresses() {
        assert!(validate_email("o'brien@x.com").is_ok());
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email("josé@x.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("").is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password(&"p".repeat(257)).is_err());
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("   ").is_err());
        assert!(validate_username("Jane Doe").is_ok());
        assert!(validate_username(&"u".repeat(129)).is_err());
    }
}
