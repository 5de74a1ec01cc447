use garde::Validate;

use crate::error::{AppError, Result};

/// The minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Validate)]
struct EmailAddress {
    #[garde(email)]
    email: String,
}

/// Normalizes an email address: surrounding whitespace removed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates the format of an (already normalized) email address.
pub fn validate_email(email: &str) -> Result<()> {
    EmailAddress {
        email: email.to_string(),
    }
    .validate()
    .map_err(|_| AppError::InvalidEmail)
}

/// Validates a password's length, counted in characters.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::ShortPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_email("  ANN@Example.com ");
        assert_eq!(once, "ann@example.com");
        assert_eq!(normalize_email(&once), once);
    }

    #[test]
    fn email_format() {
        assert!(validate_email("ann@example.com").is_ok());
        assert!(matches!(validate_email("ann"), Err(AppError::InvalidEmail)));
        assert!(matches!(validate_email("ann@"), Err(AppError::InvalidEmail)));
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(validate_password("longenough").is_ok());
        assert!(matches!(validate_password("short"), Err(AppError::ShortPassword)));
        // Eight characters, more than eight bytes.
        assert!(validate_password("ääääääää").is_ok());
        assert!(validate_password("äääääää").is_err());
    }
}
