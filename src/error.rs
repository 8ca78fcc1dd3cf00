use thiserror::Error;

use crate::prompt::SIGN_OFF;

/// Why a single forwarding attempt failed. Each variant renders to the
/// fixed reply the student sees instead of a model answer.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("model API returned status {status}: {message}")]
    Status {
        status: u16,
        message: String,
        raw_body: String,
    },

    #[error("model request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("{0}")]
    Transport(String),

    #[error("unexpected model response: {0}")]
    MalformedResponse(String),
}

impl ForwardError {
    pub fn fallback_message(&self) -> String {
        match self {
            Self::Status {
                status, message, ..
            } => {
                format!("Error: {status} - {message} - {SIGN_OFF}")
            }
            Self::Timeout { .. } => format!(
                "I apologize, but that query is quite complex and I'm taking longer than expected \
                 to process it. Could you please rephrase or break it into smaller parts? - {SIGN_OFF}"
            ),
            Self::Transport(_) | Self::MalformedResponse(_) => format!(
                "I'm temporarily disconnected from my knowledge base ({}). \
                 Please give me a moment to reconnect and try again. - {SIGN_OFF}",
                self
            ),
        }
    }
}

/// Reply used when the model answers successfully but without any candidate.
pub fn no_candidate_message() -> String {
    format!("I apologize, but I'm unable to process your request at this moment. - {SIGN_OFF}")
}

#[cfg(test)]
mod tests {
    use super::{ForwardError, no_candidate_message};

    #[test]
    fn status_fallback_names_code_and_message() {
        let err = ForwardError::Status {
            status: 429,
            message: "quota exceeded".to_string(),
            raw_body: r#"{"error":{"message":"quota exceeded"}}"#.to_string(),
        };
        assert_eq!(
            err.fallback_message(),
            "Error: 429 - quota exceeded - Your KK Agent"
        );
    }

    #[test]
    fn timeout_fallback_is_fixed() {
        let short = ForwardError::Timeout { timeout_secs: 1 }.fallback_message();
        let long = ForwardError::Timeout { timeout_secs: 30 }.fallback_message();
        assert_eq!(short, long);
        assert!(short.contains("taking longer than expected"));
        assert!(short.ends_with("Your KK Agent"));
    }

    #[test]
    fn transport_fallback_embeds_description() {
        let msg = ForwardError::Transport("connection reset".to_string()).fallback_message();
        assert!(msg.starts_with("I'm temporarily disconnected from my knowledge base (connection reset)."));
        assert!(msg.ends_with("Your KK Agent"));
    }

    #[test]
    fn malformed_response_fallback_embeds_description() {
        let msg = ForwardError::MalformedResponse("missing text".to_string()).fallback_message();
        assert!(msg.contains("(unexpected model response: missing text)"));
    }

    #[test]
    fn no_candidate_message_is_signed() {
        assert!(no_candidate_message().starts_with("I apologize, but I'm unable"));
        assert!(no_candidate_message().ends_with("Your KK Agent"));
    }
}
