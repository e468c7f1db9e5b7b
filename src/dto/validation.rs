//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest answer text accepted from a client.
const MAX_ANSWER_LENGTH: usize = 256;

/// Validates that a submitted answer is non-blank and reasonably sized.
///
/// The lifecycle compares answers trimmed, so a whitespace-only submission
/// could never match anything and only burns an attempt slot by accident.
pub fn validate_answer_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut err = ValidationError::new("answer_blank");
        err.message = Some("Answer text must not be blank".into());
        return Err(err);
    }

    if text.len() > MAX_ANSWER_LENGTH {
        let mut err = ValidationError::new("answer_length");
        err.message = Some(
            format!(
                "Answer text must be at most {} bytes (got {})",
                MAX_ANSWER_LENGTH,
                text.len()
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_answer_text_valid() {
        assert!(validate_answer_text("fourty two").is_ok());
        assert!(validate_answer_text("  padded  ").is_ok());
        assert!(validate_answer_text("x").is_ok());
    }

    #[test]
    fn test_validate_answer_text_blank() {
        assert!(validate_answer_text("").is_err());
        assert!(validate_answer_text("   ").is_err());
        assert!(validate_answer_text("\n\t").is_err());
    }

    #[test]
    fn test_validate_answer_text_too_long() {
        assert!(validate_answer_text(&"a".repeat(256)).is_ok());
        assert!(validate_answer_text(&"a".repeat(257)).is_err());
    }
}
