use thiserror::Error;

use crate::dao::storage::StorageError;

/// Result alias for the PostgreSQL backend.
pub type PgResult<T> = Result<T, PgDaoError>;

/// Errors raised by the PostgreSQL progress store.
#[derive(Debug, Error)]
pub enum PgDaoError {
    /// A required environment variable was not set.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Establishing the connection pool failed.
    #[error("failed to connect to PostgreSQL")]
    Connect {
        #[source]
        source: sqlx::Error,
    },
    /// Applying the schema on connect failed.
    #[error("failed to ensure PostgreSQL schema")]
    EnsureSchema {
        #[source]
        source: sqlx::Error,
    },
    /// A query failed while executing `operation`.
    #[error("query failed during {operation}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
    /// A stored value could not be mapped back into its entity type.
    #[error("stored value for `{column}` is out of range: {value}")]
    Decode { column: &'static str, value: String },
}

impl From<PgDaoError> for StorageError {
    fn from(err: PgDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
