//! Outbound calls to the hosted model.
//!
//! The rest of the crate only sees the [`TutorService`] trait, so the
//! conversation can be driven by a fake in tests and by [`GeminiTutor`] in the
//! application.

pub mod client;
pub mod gemini;
pub mod prompts;
pub mod types;

use thiserror::Error;

use crate::chat::{HistoryTurn, ImagePayload};
use crate::notes::TutorResponse;

pub use gemini::{GeminiSettings, GeminiTutor};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no API key configured (set GEMINI_API_KEY or pass --api-key)")]
    MissingApiKey,
    #[error("nothing to send")]
    EmptyRequest,
    #[error("request rejected with HTTP status {0}")]
    Status(u16),
    #[error("request blocked: {0}")]
    Blocked(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response carried no {0}")]
    MissingContent(&'static str),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl ApiError {
    /// The provider refused the request as out of scope.
    pub fn is_blocked(&self) -> bool {
        match self {
            ApiError::Status(403) | ApiError::Blocked(_) => true,
            ApiError::Transport(message) => {
                message.contains("403") || message.to_ascii_lowercase().contains("blocked")
            }
            _ => false,
        }
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => ApiError::Status(code),
            other => ApiError::Transport(other.to_string()),
        }
    }
}

pub trait TutorService: Send + Sync {
    /// Ask a study question. `history` holds earlier turns, oldest first.
    fn generate_study_response(
        &self,
        prompt: &str,
        history: &[HistoryTurn],
        image: Option<&ImagePayload>,
    ) -> Result<TutorResponse, ApiError>;

    /// Narrate `text`. Returns raw little-endian 16-bit PCM.
    fn generate_speech(&self, text: &str) -> Result<Vec<u8>, ApiError>;

    /// Illustrate `prompt` for a textbook-style visual aid.
    fn generate_visual_aid(&self, prompt: &str) -> Result<ImagePayload, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_and_blocked_errors_count_as_blocked() {
        assert!(ApiError::Status(403).is_blocked());
        assert!(ApiError::Blocked("SAFETY".into()).is_blocked());
        assert!(ApiError::Transport("request Blocked by policy".into()).is_blocked());
        assert!(!ApiError::Status(500).is_blocked());
        assert!(!ApiError::MissingApiKey.is_blocked());
    }
}
