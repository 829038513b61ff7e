//! LLM error types

use thiserror::Error;

/// Errors that can occur during LLM operations
///
/// The engine does not retry any of these; a failed call surfaces to the
/// caller with the task that was running (see `PlannerError::Collaborator`).
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
