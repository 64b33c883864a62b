//! Input validation for contexts
//!
//! Presence and length checks run before any store access. Uniqueness needs
//! the store and is checked by the service, with the store's unique
//! constraint as the final word.

use crate::constants::MAX_NAME_LENGTH;
use crate::error::ValidationErrorKind;

/// Validates a context name for presence and length.
///
/// Length is measured in characters, not bytes.
pub fn validate_context_name(name: &str) -> Result<(), ValidationErrorKind> {
    if name.trim().is_empty() {
        return Err(ValidationErrorKind::NameRequired);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationErrorKind::NameTooLong);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_context_name("Home").is_ok());
        assert!(validate_context_name("@phone").is_ok());
        assert!(validate_context_name(&"x".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_blank_names_are_required() {
        assert_eq!(
            validate_context_name(""),
            Err(ValidationErrorKind::NameRequired)
        );
        assert_eq!(
            validate_context_name(" \t\n"),
            Err(ValidationErrorKind::NameRequired)
        );
    }

    #[test]
    fn test_long_names_are_rejected() {
        assert_eq!(
            validate_context_name(&"x".repeat(MAX_NAME_LENGTH + 1)),
            Err(ValidationErrorKind::NameTooLong)
        );
    }

    #[test]
    fn test_length_counts_characters() {
        // 255 two-byte characters is within the limit
        assert!(validate_context_name(&"é".repeat(MAX_NAME_LENGTH)).is_ok());
    }
}
