use rusqlite::ffi;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum DbError {
    /// A unique column already holds this value. Recoverable: report the field.
    #[error("{field} is already taken")]
    UniqueViolation { field: &'static str },

    /// Input rejected before anything was written.
    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller does not own the row it tried to change.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("database lock poisoned")]
    LockPoisoned,
}

impl DbError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, Some(msg)) = &err {
            if code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
                if msg.contains("users.username") {
                    return Self::UniqueViolation { field: "username" };
                }
                if msg.contains("users.email") {
                    return Self::UniqueViolation { field: "email" };
                }
            }
        }
        Self::Sqlite(err)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DbError>;
