//! Validation

use thiserror::Error;

/// Malformed caller input, reported synchronously.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The record's natural key is empty or whitespace.
    #[error("natural key must not be blank")]
    BlankNaturalKey,

    /// A field failed an entity-specific rule.
    #[error("invalid `{field}`: {reason}")]
    InvalidField {
        /// Offending field name.
        field: &'static str,

        /// Human readable reason.
        reason: String,
    },

    /// A `since` watermark could not be parsed.
    #[error("invalid watermark `{0}`")]
    InvalidWatermark(String),

    /// A delta action other than `all`, `new` or `remove`.
    #[error("unknown action `{0}`")]
    UnknownAction(String),
}
