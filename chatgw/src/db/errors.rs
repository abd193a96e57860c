//! Database error categorization.
//!
//! Converts raw `sqlx::Error` values into a small taxonomy the HTTP layer can
//! map onto status codes without inspecting Postgres error codes itself.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Row expected but not found
    #[error("Resource not found")]
    NotFound,

    /// Unique constraint violation (duplicate key)
    #[error("Unique constraint violation{}", .constraint.as_deref().map(|c| format!(" on {c}")).unwrap_or_default())]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
    },

    /// Foreign key constraint violation (invalid reference)
    #[error("Foreign key violation{}", .constraint.as_deref().map(|c| format!(" on {c}")).unwrap_or_default())]
    ForeignKeyViolation { constraint: Option<String> },

    /// Check constraint violation (invalid data)
    #[error("Check constraint violation{}", .constraint.as_deref().map(|c| format!(" on {c}")).unwrap_or_default())]
    CheckViolation { constraint: Option<String> },

    /// Everything else (connection failures, decode errors, ...)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().map(str::to_owned);
                let table = db_err.table().map(str::to_owned);
                if db_err.is_unique_violation() {
                    DbError::UniqueViolation { constraint, table }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation { constraint }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation { constraint }
                } else {
                    DbError::Other(err.into())
                }
            }
            _ => DbError::Other(err.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
