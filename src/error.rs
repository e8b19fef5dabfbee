//! Error taxonomy shared by the repositories and services.

use rusqlite::{ffi, ErrorCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Bad parameter: {0}")]
    BadParameter(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn bad_parameter(msg: impl Into<String>) -> Self {
        Self::BadParameter(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    pub fn is_bad_parameter(&self) -> bool {
        matches!(self, Self::BadParameter(_))
    }
}

/// Map a unique-constraint failure to `Conflict`, leaving every other
/// SQLite error untouched. `msg` receives SQLite's own description.
pub(crate) fn on_unique_violation(
    err: rusqlite::Error,
    msg: impl FnOnce(&str) -> String,
) -> Error {
    if let rusqlite::Error::SqliteFailure(e, detail) = &err {
        if e.code == ErrorCode::ConstraintViolation
            && e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        {
            return Error::Conflict(msg(
                detail.as_deref().unwrap_or("unique constraint failed"),
            ));
        }
    }
    Error::Database(err)
}
