//! Database errors the handlers can act on.
//!
//! Constraint violations keep the constraint and table names so callers can tell a duplicate
//! inquiry from a pending invitation or an invite code collision.

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Entity not found")]
    NotFound,

    #[error("Unique constraint violation on {}", constraint.as_deref().unwrap_or("unknown constraint"))]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    #[error("Foreign key violation on {}", constraint.as_deref().unwrap_or("unknown constraint"))]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    #[error("Check constraint violation on {}", constraint.as_deref().unwrap_or("unknown constraint"))]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Connection, protocol and procedure failures
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    /// True when this is a unique violation on the named constraint
    pub fn is_unique_violation_on(&self, name: &str) -> bool {
        matches!(self, DbError::UniqueViolation { constraint: Some(c), .. } if c == name)
    }

    /// Table named by a constraint violation
    pub fn table(&self) -> Option<&str> {
        match self {
            DbError::UniqueViolation { table, .. }
            | DbError::ForeignKeyViolation { table, .. }
            | DbError::CheckViolation { table, .. } => table.as_deref(),
            DbError::NotFound | DbError::Other(_) => None,
        }
    }
}

fn violation(db_err: &dyn DatabaseError) -> Option<DbError> {
    let constraint = db_err.constraint().map(str::to_string);
    let table = db_err.table().map(str::to_string);
    let message = db_err.message().to_string();

    match db_err.kind() {
        ErrorKind::UniqueViolation => Some(DbError::UniqueViolation { constraint, table, message }),
        ErrorKind::ForeignKeyViolation => Some(DbError::ForeignKeyViolation { constraint, table, message }),
        ErrorKind::CheckViolation => Some(DbError::CheckViolation { constraint, table, message }),
        _ => None,
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => violation(db_err.as_ref()).unwrap_or_else(|| DbError::Other(err.into())),
            _ => DbError::Other(err.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
