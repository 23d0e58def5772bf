use rusqlite::ffi;
use simactive_shared::{ContextError, EntityKind, RepoError};
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// The caller's context expired or was cancelled.
    #[error("Operation aborted: {0}")]
    Context(#[from] ContextError),

    /// Another thread panicked while holding the connection.
    #[error("Connection lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// `true` for UNIQUE / PRIMARY KEY constraint failures.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        }
    }

    /// Map onto the repository taxonomy. `detail` names the id or input
    /// fields of the failed operation.
    pub fn into_repo(self, entity: EntityKind, detail: impl Into<String>) -> RepoError {
        let detail = detail.into();
        if self.is_unique_violation() {
            return RepoError::conflict(entity, detail);
        }
        match self {
            StoreError::NotFound => RepoError::not_found(entity, detail),
            other => {
                tracing::warn!(entity = %entity, detail = %detail, error = %other, "store operation failed");
                RepoError::internal(entity, format!("{detail}: {other}"))
            }
        }
    }
}

/// Turn `QueryReturnedNoRows` into [`StoreError::NotFound`].
pub(crate) fn no_rows_as_not_found(err: StoreError) -> StoreError {
    match err {
        StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows) => StoreError::NotFound,
        other => other,
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
