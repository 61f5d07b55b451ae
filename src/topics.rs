//! Topics
//!
//! Every committed mutation is published on a subject named after the entity
//! module and the operation, e.g. `shopsync.saleChannel.bulk-created`.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use thiserror::Error;

/// Operation an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Single record created.
    Created,

    /// Single record updated.
    Updated,

    /// Single record soft-deleted.
    Deleted,

    /// Batch of records created.
    BulkCreated,

    /// Batch of records updated.
    BulkUpdated,

    /// Batch of records soft-deleted.
    BulkDeleted,
}

impl Operation {
    /// Every operation, in topic declaration order.
    pub const ALL: [Self; 6] = [
        Self::Created,
        Self::Updated,
        Self::Deleted,
        Self::BulkCreated,
        Self::BulkUpdated,
        Self::BulkDeleted,
    ];

    /// Subject token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::BulkCreated => "bulk-created",
            Self::BulkUpdated => "bulk-updated",
            Self::BulkDeleted => "bulk-deleted",
        }
    }

    /// Whether the message body is an array of snapshots.
    pub fn is_bulk(self) -> bool {
        matches!(self, Self::BulkCreated | Self::BulkUpdated | Self::BulkDeleted)
    }

    /// Whether the snapshots describe deleted records.
    pub fn is_delete(self) -> bool {
        matches!(self, Self::Deleted | Self::BulkDeleted)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Unrecognised operation token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation `{0}`")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|operation| operation.as_str() == value)
            .ok_or_else(|| UnknownOperation(value.to_string()))
    }
}

/// Subject naming for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    prefix: String,
}

impl TopicScheme {
    /// Scheme rooted at `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Subject prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Subject for `(module, operation)`.
    pub fn topic(&self, module: &str, operation: Operation) -> String {
        format!("{}.{module}.{operation}", self.prefix)
    }

    /// Wildcard subject covering every operation of `module`.
    pub fn module_filter(&self, module: &str) -> String {
        format!("{}.{module}.>", self.prefix)
    }

    /// Stream name holding `module`'s subjects.
    pub fn stream_name(&self, module: &str) -> String {
        format!("{}_{module}", self.prefix)
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Split a subject back into module and operation.
    pub fn parse<'a>(&self, subject: &'a str) -> Option<(&'a str, Operation)> {
        let rest = subject.strip_prefix(self.prefix.as_str())?.strip_prefix('.')?;
        let (module, operation) = rest.split_once('.')?;

        Some((module, operation.parse().ok()?))
    }
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self::new("shopsync")
    }
}
