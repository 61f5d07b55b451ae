//! Projection errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;
use tokio::time::error::Elapsed;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("projection row already exists")]
    AlreadyExists,

    #[error("subject `{0}` is not handled by this projection")]
    UnexpectedSubject(String),

    #[error("failed to decode event payload")]
    Decode(#[from] serde_json::Error),

    #[error("projection store timed out")]
    Timeout(#[from] Elapsed),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ProjectionError {
    fn from(error: Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
