use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use validator::Validate;

/// Minimum password length accepted at sign-up
pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Registration form problems, reported one at a time in form order
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Sign-up form as submitted by the user
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[validate(regex(path = *EMAIL_PATTERN))]
    pub email: String,
    pub password: String,
    #[serde(skip)]
    #[validate(must_match(other = "password"))]
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegistrationForm {
    /// Validate the form, returning the first problem a user should fix.
    pub fn check(&self) -> Result<(), RegistrationError> {
        let required = [
            &self.email,
            &self.password,
            &self.first_name,
            &self.last_name,
        ];
        if required.iter().any(|field| field.is_empty()) {
            return Err(RegistrationError::MissingFields);
        }

        let errors = self.validate().err();
        let invalid_email = errors
            .as_ref()
            .is_some_and(|e| e.field_errors().contains_key("email"));
        if invalid_email {
            Err(RegistrationError::InvalidEmail)
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            Err(RegistrationError::PasswordTooShort)
        } else if errors.is_some() {
            Err(RegistrationError::PasswordMismatch)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            email: "ranger@example.org".to_string(),
            password: "correct-horse".to_string(),
            confirm_password: "correct-horse".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Oak".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        assert_eq!(form().check(), Ok(()));
    }

    #[test]
    fn test_missing_fields_reported_first() {
        let mut f = form();
        f.last_name.clear();
        f.email = "not-an-email".to_string();
        assert_eq!(f.check(), Err(RegistrationError::MissingFields));
    }

    #[test]
    fn test_invalid_email() {
        let mut f = form();
        f.email = "ranger@example".to_string();
        assert_eq!(f.check(), Err(RegistrationError::InvalidEmail));

        f.email = "ranger @example.org".to_string();
        assert_eq!(f.check(), Err(RegistrationError::InvalidEmail));
    }

    #[test]
    fn test_short_password_before_mismatch() {
        let mut f = form();
        f.password = "short".to_string();
        f.confirm_password = "different".to_string();
        assert_eq!(f.check(), Err(RegistrationError::PasswordTooShort));
    }

    #[test]
    fn test_password_length_boundary() {
        let mut f = form();
        f.password = "a".repeat(MIN_PASSWORD_LENGTH - 1);
        f.confirm_password = f.password.clone();
        assert_eq!(f.check(), Err(RegistrationError::PasswordTooShort));
        assert_eq!(
            RegistrationError::PasswordTooShort.to_string(),
            "Password must be at least 8 characters"
        );

        f.password = "é".repeat(MIN_PASSWORD_LENGTH);
        f.confirm_password = f.password.clone();
        assert_eq!(f.check(), Ok(()));
    }

    #[test]
    fn test_password_mismatch() {
        let mut f = form();
        f.confirm_password = "correct-horse-battery".to_string();
        assert_eq!(f.check(), Err(RegistrationError::PasswordMismatch));
    }

    #[test]
    fn test_serialized_body_omits_confirmation() {
        let json = serde_json::to_value(form()).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert!(json.get("confirmPassword").is_none());
    }
}
