//! The module contains the errors the engine can throw.
//!
//! - [`KeyNotFound`] thrown when a record does not exist.
//! - [`ExistingKey`] thrown when a unique value (email, username, course code)
//!   is already taken.
//! - [`InvalidField`] thrown when an input field fails validation.
//! - [`Forbidden`] thrown when the caller lacks the staff capability.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`InvalidField`]: EngineError::InvalidField
//!  [`Forbidden`]: EngineError::Forbidden
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0} not found.")]
    KeyNotFound(String),
    #[error("{message}")]
    ExistingKey { field: String, message: String },
    #[error("{message}")]
    InvalidField { field: String, message: String },
    #[error("{0} is required.")]
    MissingField(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// A unique index and the conflict reported when an insert or update hits it.
pub(crate) struct UniqueKey {
    /// `table.column` as named by the database in the violation message.
    pub column: &'static str,
    pub field: &'static str,
    pub message: &'static str,
}

impl EngineError {
    /// Turn a unique-index violation on one of `keys` into `ExistingKey`.
    /// Any other database error is kept as is.
    pub(crate) fn from_db(err: DbErr, keys: &[UniqueKey]) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            if let Some(key) = keys.iter().find(|key| detail.contains(key.column)) {
                return Self::existing(key.field, key.message);
            }
        }
        Self::Database(err)
    }

    pub(crate) fn existing(field: &str, message: impl Into<String>) -> Self {
        Self::ExistingKey {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Input field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ExistingKey { field, .. } | Self::InvalidField { field, .. } => Some(field),
            Self::MissingField(field) => Some(field),
            _ => None,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (
                Self::ExistingKey {
                    field: fa,
                    message: ma,
                },
                Self::ExistingKey {
                    field: fb,
                    message: mb,
                },
            ) => fa == fb && ma == mb,
            (
                Self::InvalidField {
                    field: fa,
                    message: ma,
                },
                Self::InvalidField {
                    field: fb,
                    message: mb,
                },
            ) => fa == fb && ma == mb,
            (Self::MissingField(a), Self::MissingField(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvalidCredentials(a), Self::InvalidCredentials(b)) => a == b,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
