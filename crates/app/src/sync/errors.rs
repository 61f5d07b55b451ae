//! Records service errors.

use thiserror::Error;

use shopsync::validation::ValidationError;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum RecordsServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("record not found")]
    NotFound,

    #[error("natural key already exists")]
    DuplicateKey,

    #[error("store failure")]
    Store(#[source] StoreError),
}

impl From<StoreError> for RecordsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound,
            StoreError::DuplicateKey => Self::DuplicateKey,
            other => Self::Store(other),
        }
    }
}

impl From<serde_json::Error> for RecordsServiceError {
    fn from(error: serde_json::Error) -> Self {
        Self::Store(StoreError::Serialization(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_lookups_keep_their_meaning() {
        assert!(matches!(
            RecordsServiceError::from(StoreError::NotFound),
            RecordsServiceError::NotFound
        ));
        assert!(matches!(
            RecordsServiceError::from(StoreError::DuplicateKey),
            RecordsServiceError::DuplicateKey
        ));
        assert!(matches!(
            RecordsServiceError::from(StoreError::InvalidData),
            RecordsServiceError::Store(StoreError::InvalidData)
        ));
    }
}
