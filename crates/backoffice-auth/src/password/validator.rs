//! Password policy enforcement for new passwords.

use backoffice_core::config::AuthConfig;
use backoffice_core::error::AppError;

/// Validates password strength against configured policies.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Validates a password, reporting the first violation against the
    /// `password` field.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.chars().count() < self.min_length {
            return Err(AppError::invalid_field(
                "password",
                format!(
                    "The password field must be at least {} characters.",
                    self.min_length
                ),
            ));
        }

        let estimate = zxcvbn::zxcvbn(password, &[]);
        if estimate.score() < zxcvbn::Score::Two {
            return Err(AppError::invalid_field(
                "password",
                "The given password is too easy to guess.",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> PasswordValidator {
        PasswordValidator::new(&AuthConfig::default())
    }

    #[test]
    fn test_rejects_short_password() {
        let err = validator().validate("abc").unwrap_err();
        assert!(err.fields.unwrap().contains_key("password"));
    }

    #[test]
    fn test_rejects_guessable_password() {
        assert!(validator().validate("password").is_err());
    }

    #[test]
    fn test_accepts_passphrase() {
        assert!(validator().validate("correct horse battery staple").is_ok());
    }
}
