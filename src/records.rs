//! Records
//!
//! A [`Record`] is one tenant-scoped entity as held by the change-tracking
//! store: the entity payload plus the identifiers and audit stamps needed to
//! answer "what changed since T". Soft-deleted records keep their row and gain
//! `deleted_at`/`deleted_by`.

use std::fmt::Debug;

use jiff::Timestamp;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    uuids::{GuidFixed, ShopUuid},
    validation::ValidationError,
};

/// A business entity managed by the synchronization core.
pub trait Entity:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Module name used for topics, master-sync markers and storage partitioning.
    const MODULE: &'static str;

    /// Payload fields matched by free-text search in addition to the natural key.
    const SEARCH_FIELDS: &'static [&'static str] = &[];

    /// Business identifier, unique among live records of a shop.
    fn natural_key(&self) -> &str;

    /// Check the payload before it is written.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the natural key is blank. Implementors
    /// may add entity specific rules.
    fn validate(&self) -> Result<(), ValidationError> {
        if self.natural_key().trim().is_empty() {
            return Err(ValidationError::BlankNaturalKey);
        }

        Ok(())
    }
}

/// Creation, update and soft-delete stamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    /// Creation time.
    pub created_at: Timestamp,

    /// Creating user.
    pub created_by: String,

    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    /// Last updating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,

    /// Soft-delete time; absent while the record is live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,

    /// Deleting user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

impl Audit {
    /// Stamps for a freshly created record.
    pub fn created(at: Timestamp, by: impl Into<String>) -> Self {
        Self {
            created_at: at,
            created_by: by.into(),
            updated_at: None,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Most recent create or update time.
    pub fn last_activity(&self) -> Timestamp {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// Whether the record has not been soft-deleted.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A stored entity with its identifiers and audit stamps.
///
/// This is also the snapshot published on every mutation and the element type
/// of the "created or updated since" feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    /// Owning shop.
    #[serde(rename = "shopId")]
    pub shop: ShopUuid,

    /// Immutable logical identifier.
    #[serde(rename = "guidFixed")]
    pub guid: GuidFixed<T>,

    /// Entity payload.
    #[serde(flatten)]
    pub data: T,

    /// Audit stamps.
    #[serde(flatten)]
    pub audit: Audit,
}

impl<T: Entity> Record<T> {
    /// The record's natural key.
    pub fn natural_key(&self) -> &str {
        self.data.natural_key()
    }
}

/// Element of the "created or updated since" feed.
pub type ActivityRecord<T> = Record<T>;

/// Element of the "deleted since" feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteActivityRecord<T> {
    /// Owning shop.
    #[serde(rename = "shopId")]
    pub shop: ShopUuid,

    /// Identifier of the deleted record.
    #[serde(rename = "guidFixed")]
    pub guid: GuidFixed<T>,

    /// Soft-delete time.
    pub deleted_at: Timestamp,

    /// Deleting user.
    pub deleted_by: String,
}

/// A record staged for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument<T> {
    /// Identifier assigned at creation.
    pub guid: GuidFixed<T>,

    /// Entity payload.
    pub data: T,

    /// Creation time.
    pub created_at: Timestamp,

    /// Creating user.
    pub created_by: String,
}

impl<T: Entity> NewDocument<T> {
    /// Stage `data` with a fresh identifier.
    pub fn stamp(data: T, at: Timestamp, by: impl Into<String>) -> Self {
        Self {
            guid: GuidFixed::new(),
            data,
            created_at: at,
            created_by: by.into(),
        }
    }
}

/// A replacement payload for a live record.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpdate<T> {
    /// New payload.
    pub data: T,

    /// Update time.
    pub updated_at: Timestamp,

    /// Updating user.
    pub updated_by: String,
}
