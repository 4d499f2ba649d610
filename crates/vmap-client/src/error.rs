//! Error types for talking to the mapping server.

use serde_json::Value;
use thiserror::Error;
use vmap_map::{FailureKind, StoreFailure};

/// Errors raised by [`ApiClient`](crate::ApiClient) calls.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// The server refused the request with a 400 and an explanation.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// The addressed record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("server returned HTTP {status}: {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Settings file could not be read or parsed.
    #[error("settings error: {0}")]
    Settings(String),

    /// A configured header value is not valid in HTTP.
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
}

impl ClientError {
    /// Returns a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Rejected(message) => message,
            Self::Network(_) => "Could not reach the mapping server. Please check the base URL.",
            Self::NotFound(_) => "The requested mapping does not exist.",
            Self::Settings(_) | Self::InvalidHeader(_) => {
                "The client settings are invalid. Please check the configuration file."
            }
            Self::Server { .. } | Self::JsonParse(_) => {
                "The request could not be completed. Please try again later."
            }
        }
    }

    /// Returns whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl StoreFailure for ClientError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Rejected(message) => FailureKind::Validation(message.clone()),
            _ => FailureKind::Transport,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::JsonParse(err.to_string());
        }
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParse(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        Self::Settings(err.to_string())
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Pulls the human-readable reason out of a 400 body.
///
/// The server answers with `{"error": ...}`, `{"message": ...}` or
/// `{"errors": [...]}`, sometimes serialized twice into a JSON string.
/// Anything else is returned as trimmed text.
pub(crate) fn rejection_message(body: &str) -> String {
    let trimmed = body.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => message_from_value(&value).unwrap_or_else(|| trimmed.to_string()),
        Err(_) => trimmed.to_string(),
    }
}

fn message_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(inner) => match serde_json::from_str::<Value>(inner) {
            Ok(nested @ Value::Object(_)) => message_from_value(&nested),
            _ => Some(inner.clone()),
        },
        Value::Object(map) => ["error", "message", "errors"]
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(message_from_value),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(message_from_value).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => None,
    }
}
