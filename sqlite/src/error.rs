//! Error types for SQLite storage.

use command_manual_dispatch::StoreError;
use thiserror::Error;

/// Errors that can occur while pooling connections or storing prefixes.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// No connection could be opened or returned to the pool.
    #[error("pool error: {0}")]
    PoolError(String),

    /// Migration lifecycle operation failure.
    #[error("migration error: {0}")]
    MigrationError(String),

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only alphanumeric characters and underscores")]
    InvalidPrefix(String),

    /// A guild ID that does not fit an SQLite integer.
    #[error("guild ID {0} is out of range")]
    GuildOutOfRange(u64),
}

impl From<SqliteError> for StoreError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::PoolError(message) => StoreError::Unavailable(message),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
