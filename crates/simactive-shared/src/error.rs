use thiserror::Error;

use crate::types::{EntityId, EntityKind};

/// The three failure kinds callers of the repository layer can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Conflict,
    NotFound,
    Internal,
}

/// Errors raised by stores, mirrors and write-through repositories.
///
/// `detail` carries the id and/or input fields involved so a failure can be
/// diagnosed from the message alone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// A uniqueness constraint would be or was violated.
    #[error("{entity} with {detail} already exists")]
    Conflict { entity: EntityKind, detail: String },

    /// The referenced entity does not exist in the tier that was asked.
    #[error("{entity} with {detail} not found")]
    NotFound { entity: EntityKind, detail: String },

    /// Connectivity, malformed rows, cancellation, poisoned locks.
    #[error("internal {entity} error: {detail}")]
    Internal { entity: EntityKind, detail: String },

    /// Mirror and store disagree after a partially applied write.
    #[error("{entity} {id} is inconsistent between mirror and store: {detail}")]
    Inconsistent {
        entity: EntityKind,
        id: EntityId,
        detail: String,
    },
}

impl RepoError {
    pub fn conflict(entity: EntityKind, detail: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            detail: detail.into(),
        }
    }

    pub fn not_found(entity: EntityKind, detail: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            detail: detail.into(),
        }
    }

    pub fn internal(entity: EntityKind, detail: impl Into<String>) -> Self {
        Self::Internal {
            entity,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Internal { .. } | Self::Inconsistent { .. } => ErrorKind::Internal,
        }
    }

    pub fn entity(&self) -> EntityKind {
        match self {
            Self::Conflict { entity, .. }
            | Self::NotFound { entity, .. }
            | Self::Internal { entity, .. }
            | Self::Inconsistent { entity, .. } => *entity,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

/// Convenience alias used by the repository layer.
pub type RepoResult<T> = std::result::Result<T, RepoError>;

/// Why a [`Context`](crate::context::Context) stopped admitting work.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inconsistent_is_internal_kind() {
        let err = RepoError::Inconsistent {
            entity: EntityKind::Sim,
            id: 4,
            detail: "store delete failed".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.is_not_found());
        assert_eq!(err.entity(), EntityKind::Sim);
    }

    #[test]
    fn messages_carry_context() {
        let err = RepoError::conflict(EntityKind::Sim, "number 19998887766");
        assert_eq!(
            err.to_string(),
            "sim card with number 19998887766 already exists"
        );

        let err = RepoError::not_found(EntityKind::Service, "id 9");
        assert_eq!(err.to_string(), "service with id 9 not found");
        assert!(err.is_not_found());
    }
}
