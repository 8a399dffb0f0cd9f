//! Request validation ahead of the pipeline.
//!
//! Lengths are counted in characters of the trimmed description.

use flowsmith_agent::ValidationSection;

use crate::error::{ApiError, Result};

/// Check `description` against `limits` and return it trimmed.
pub fn validate_description(description: &str, limits: &ValidationSection) -> Result<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("description", "description is required"));
    }

    let chars = trimmed.chars().count();
    if chars < limits.min_description_len {
        return Err(ApiError::validation(
            "description",
            format!(
                "description must be at least {} characters",
                limits.min_description_len
            ),
        ));
    }
    if chars > limits.max_description_len {
        return Err(ApiError::validation(
            "description",
            format!(
                "description must be at most {} characters",
                limits.max_description_len
            ),
        ));
    }

    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ValidationSection {
        ValidationSection {
            min_description_len: 10,
            max_description_len: 20,
        }
    }

    #[test]
    fn blank_is_required() {
        let err = validate_description("   \n", &limits()).unwrap_err();
        assert_eq!(err.to_string(), "description is required");
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(validate_description("0123456789", &limits()).is_ok());
        assert!(validate_description("012345678", &limits()).is_err());
        assert!(validate_description(&"x".repeat(20), &limits()).is_ok());
        assert!(validate_description(&"x".repeat(21), &limits()).is_err());
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Ten characters, twenty bytes.
        assert!(validate_description("éééééééééé", &limits()).is_ok());
    }

    #[test]
    fn result_is_trimmed() {
        assert_eq!(
            validate_description("  send a slack ping  ", &limits()).unwrap(),
            "send a slack ping"
        );
    }
}
