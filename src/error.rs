//! Error types for terrain loading.

use thiserror::Error;

/// Fatal failures of the Grid Model. Everything downstream of a successful
/// load is total and never returns these.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("non-square or malformed grid: {0}")]
    Validation(String),

    #[error("invalid terrain payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        LoadError::Validation(detail.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LoadError::Validation(_) | LoadError::Payload(_))
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
