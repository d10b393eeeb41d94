//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::{SquadId, UserId};

/// Domain errors represent violations of the org-structure invariants.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("user appears more than once in the hierarchy: {0}")]
    DuplicateNode(UserId),

    #[error("user not found in hierarchy: {0}")]
    UnknownUser(UserId),

    #[error("supervisor {supervisor} of user {user} not found in hierarchy")]
    UnknownSupervisor { user: UserId, supervisor: UserId },

    #[error("squad {squad} assigned to user {user} not found in catalog")]
    UnknownSquad { user: UserId, squad: SquadId },

    #[error("cycle detected in hierarchy at user: {0}")]
    CycleDetected(UserId),

    #[error("more than one change for user: {0}")]
    DuplicateChange(UserId),

    #[error("invalid draft name: {0:?}")]
    InvalidDraftName(String),

    #[error("draft is already published: {0}")]
    DraftPublished(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
