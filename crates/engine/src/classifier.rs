//! Failure classification: turns a generation failure into the error turn
//! the user sees in their transcript.

use parley_core::turn::Turn;

use crate::adapter::GenerationFailure;

pub const SAFETY_STOPPED_MESSAGE: &str = "Response generation stopped by safety filters.";
pub const PROMPT_BLOCKED_MESSAGE: &str =
    "Your prompt was blocked due to safety policies. Please rephrase.";
pub const CONNECTION_MESSAGE: &str =
    "Network issue: failed to connect to the AI service. Please try again later.";

/// User-facing text for a failure.
pub fn error_message(failure: &GenerationFailure) -> String {
    match failure {
        GenerationFailure::SafetyStopped { .. } => SAFETY_STOPPED_MESSAGE.to_string(),
        GenerationFailure::PromptBlocked { .. } => PROMPT_BLOCKED_MESSAGE.to_string(),
        GenerationFailure::Config { detail } => {
            format!("Configuration error: {}.", sentence(detail))
        }
        GenerationFailure::Connection { .. } => CONNECTION_MESSAGE.to_string(),
        GenerationFailure::Unexpected { category, detail } => {
            format!("Unexpected error: {category} - {}.", sentence(detail))
        }
    }
}

/// An `error` turn carrying [`error_message`].
pub fn classify(failure: &GenerationFailure) -> Turn {
    Turn::error(error_message(failure))
}

// Detail without trailing whitespace or a final period, so the template's
// own period is not doubled.
fn sentence(detail: &str) -> &str {
    let detail = detail.trim_end();
    detail.strip_suffix('.').unwrap_or(detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::turn::Role;

    #[test]
    fn fixed_messages() {
        let turn = classify(&GenerationFailure::SafetyStopped {
            detail: "SAFETY".into(),
        });
        assert_eq!(turn.role(), Role::Error);
        assert_eq!(turn.content(), SAFETY_STOPPED_MESSAGE);

        assert_eq!(
            error_message(&GenerationFailure::PromptBlocked {
                detail: "OTHER".into()
            }),
            "Your prompt was blocked due to safety policies. Please rephrase."
        );
        assert_eq!(
            error_message(&GenerationFailure::Connection {
                detail: "connection refused".into()
            }),
            "Network issue: failed to connect to the AI service. Please try again later."
        );
    }

    #[test]
    fn config_message_includes_detail() {
        let msg = error_message(&GenerationFailure::Config {
            detail: "API key not set".into(),
        });
        assert_eq!(msg, "Configuration error: API key not set.");
    }

    #[test]
    fn unexpected_message_includes_category_and_detail() {
        let msg = error_message(&GenerationFailure::Unexpected {
            category: "RateLimited".into(),
            detail: "quota exhausted".into(),
        });
        assert_eq!(msg, "Unexpected error: RateLimited - quota exhausted.");
    }

    #[test]
    fn trailing_period_is_not_doubled() {
        let msg = error_message(&GenerationFailure::Config {
            detail: "Model 'x' was not found.".into(),
        });
        assert_eq!(msg, "Configuration error: Model 'x' was not found.");

        let msg = error_message(&GenerationFailure::Unexpected {
            category: "ApiError".into(),
            detail: "Service unavailable. ".into(),
        });
        assert_eq!(msg, "Unexpected error: ApiError - Service unavailable.");
    }
}
