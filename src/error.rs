use std::io;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing configuration value: {0}")]
    MissingConfig(&'static str),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("session has a failed commit; roll back before reusing it")]
    RollbackRequired,
    #[error("unknown class: {0}")]
    UnknownClass(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no instance found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Splits constraint violations out of generic database failures.
    pub fn from_sql(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                AppError::Constraint(message.clone().unwrap_or_else(|| code.to_string()))
            }
            _ => AppError::Database(err),
        }
    }
}
