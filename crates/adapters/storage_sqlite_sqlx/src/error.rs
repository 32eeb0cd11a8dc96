//! Storage errors and their mapping onto [`CampusError`].
//!
//! Constraint failures reported by `SQLite` are classified, so a duplicate
//! building code or a floor pointing at a missing building surfaces as such
//! rather than as an opaque database failure.

use campushub_domain::error::{CampusError, NotFoundError, VersionConflict};
use sqlx::error::ErrorKind;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A `UNIQUE` constraint rejected the row.
    #[error("duplicate row: {0}")]
    Duplicate(String),

    /// A `REFERENCES` constraint rejected the row.
    #[error("dangling reference: {0}")]
    DanglingReference(String),

    /// A `CHECK` or `NOT NULL` constraint rejected the row.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A query or connection failed.
    #[error("database error")]
    Database(#[source] sqlx::Error),

    /// Failed to encode a value stored as JSON.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        let Some(db) = err.as_database_error() else {
            return Self::Database(err);
        };
        let message = db.message().to_string();
        match db.kind() {
            ErrorKind::UniqueViolation => Self::Duplicate(message),
            ErrorKind::ForeignKeyViolation => Self::DanglingReference(message),
            ErrorKind::CheckViolation | ErrorKind::NotNullViolation => Self::Constraint(message),
            _ => Self::Database(err),
        }
    }
}

impl From<StorageError> for CampusError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Explain an optimistic `UPDATE` that touched no row.
///
/// `current` is the version read back for `id`: a missing row means the
/// aggregate is gone, any stored version means someone saved first.
pub(crate) fn rejected_update(
    entity: &'static str,
    id: String,
    expected: u64,
    current: Option<i64>,
) -> CampusError {
    match current {
        Some(_) => VersionConflict {
            entity,
            id,
            expected,
        }
        .into(),
        None => NotFoundError { entity, id }.into(),
    }
}
