//! Storage layer errors, shared by the local (SQLite) and remote (Postgres)
//! implementations.

use thiserror::Error;
use keeper_domain::KeeperError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("bad revision: expected {expected}, got {actual}")]
    BadRevision { expected: u64, actual: u64 },

    #[error("unknown user")]
    UnknownUser,

    #[error("bad password")]
    BadPassword,

    #[error("no active user")]
    NoActiveUser,

    #[error("database error: {0}")]
    Database(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for KeeperError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => KeeperError::NotFound(id),
            StoreError::AlreadyExists(id) => KeeperError::AlreadyExists(id),
            StoreError::BadRevision { expected, actual } => {
                KeeperError::BadRevision { expected, actual }
            }
            StoreError::UnknownUser => KeeperError::UnknownUser,
            StoreError::BadPassword => KeeperError::BadPassword,
            StoreError::NoActiveUser => KeeperError::NoActiveUser,
            StoreError::Database(msg) => KeeperError::Internal(msg),
            StoreError::Connection(msg) => KeeperError::Internal(msg),
            StoreError::Serialization(msg) => KeeperError::Internal(msg),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if is_sqlite_unique_violation(&err) {
            return StoreError::AlreadyExists(err.to_string());
        }

        StoreError::Database(err.to_string())
    }
}

fn is_sqlite_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.code().map(|c| c == "23505").unwrap_or(false) {
                    StoreError::AlreadyExists(db_err.to_string())
                } else if is_postgres_connection_error(db_err.code().as_deref()) {
                    StoreError::Connection(db_err.to_string())
                } else {
                    StoreError::Database(db_err.to_string())
                }
            }
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Connection(err.to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// SQLSTATE class `08` is "Connection Exception" -- the class worth
/// retrying on; anything else is a logical error that won't clear on
/// its own.
#[cfg(feature = "postgres")]
fn is_postgres_connection_error(code: Option<&str>) -> bool {
    code.map(|c| c.starts_with("08")).unwrap_or(false)
}
