use crate::error::LearnifyError;

pub mod adaptive;
pub mod ai;
pub mod analytics;
pub mod graph;
pub mod lessons;
pub mod paths;
pub mod peer;
pub mod progress;
pub mod quizzes;
pub mod sel;
pub mod styles;
pub mod users;
pub mod xp;

/// Reject blank required strings with a `MISSING_FIELD` validation error.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), LearnifyError> {
    if value.trim().is_empty() {
        return Err(LearnifyError::validation(
            "MISSING_FIELD",
            format!("{field} is required."),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert!(require_text("title", "Fractions").is_ok());
        let err = require_text("title", "   ").unwrap_err();
        assert!(matches!(
            err,
            LearnifyError::Validation { ref code, ref message }
                if code == "MISSING_FIELD" && message == "title is required."
        ));
    }
}
