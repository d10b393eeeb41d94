//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, DraftId};
use crate::infrastructure::traits::StoreError;

/// Application errors wrap domain errors and add the store-facing taxonomy.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("invalid input: {message}")]
    Validation { message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("draft already published: {0}")]
    AlreadyPublished(DraftId),

    #[error("store unreachable: {context}")]
    Network {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn draft_not_found(id: DraftId) -> Self {
        Self::NotFound {
            kind: "draft",
            id: id.to_string(),
        }
    }

    /// True for failures the caller may retry unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl From<StoreError> for ApplicationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            StoreError::Conflict(message) => Self::Conflict { message },
            StoreError::AlreadyPublished(id) => Self::AlreadyPublished(id),
            StoreError::Invalid(message) => Self::Validation { message },
            StoreError::Rejected(e) => Self::Domain(e),
            StoreError::Transport { context, source } => Self::Network { context, source },
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
