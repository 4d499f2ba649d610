use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),
    #[error("invalid mapping id: {0}")]
    InvalidMappingId(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
