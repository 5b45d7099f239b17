use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced by dictionary operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DictionaryError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    /// Message reported by the persistence collaborator, passed through as is.
    #[error("{0}")]
    Persistence(String),

    #[error("lookup backend failed: {0}")]
    Upstream(String),
}

impl DictionaryError {
    pub fn validation(message: impl Into<String>) -> Self {
        DictionaryError::Validation(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        DictionaryError::Upstream(message.into())
    }
}

impl From<StoreError> for DictionaryError {
    fn from(value: StoreError) -> Self {
        DictionaryError::Persistence(value.to_string())
    }
}

pub type DictionaryResult<T> = Result<T, DictionaryError>;
