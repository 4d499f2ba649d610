//! Error types for editor persistence.

use thiserror::Error;

/// Errors from editor operations that talk to a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// Local checks failed; nothing was sent.
    #[error("Mapping has {errors} validation error(s): {message}")]
    Invalid { errors: usize, message: String },
    /// The server refused the payload (HTTP 400) with this message.
    #[error("Rejected by server: {0}")]
    Rejected(String),
    /// The request did not complete (connection or server failure).
    #[error("Request failed: {0}")]
    Unavailable(String),
    /// The operation needs a stored mapping but the editor holds a new one.
    #[error("Mapping has no id yet")]
    NotSaved,
}

impl EditorError {
    /// Message shown inline next to the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid { message, .. } => message.clone(),
            Self::Rejected(message) => message.clone(),
            Self::Unavailable(_) => GENERIC_FAILURE.to_string(),
            Self::NotSaved => "Save the mapping first.".to_string(),
        }
    }
}

pub(crate) const GENERIC_FAILURE: &str =
    "The request could not be completed. Please try again later.";
