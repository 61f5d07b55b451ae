//! Change-tracking store
//!
//! Durable, tenant-scoped storage of [`Record`]s with soft-delete and audit
//! stamps. The store is split by capability so services and test doubles only
//! implement what they need: writes, live lookups and the two delta queries.

use async_trait::async_trait;
use jiff::Timestamp;

use shopsync::{
    query::{Filters, SearchQuery, Window},
    records::{DeleteActivityRecord, DocumentUpdate, Entity, NewDocument, Record},
    uuids::{GuidFixed, ShopUuid},
};

pub mod errors;
mod postgres;

pub use errors::StoreError;
pub use postgres::PgDocumentStore;

/// Mutations. Every write stamps the audit fields it is handed.
#[async_trait]
pub trait DocumentWriter<T: Entity>: Send + Sync {
    /// Insert a live record.
    ///
    /// Fails with [`StoreError::DuplicateKey`] when a live record already holds the natural key.
    async fn create(&self, shop: ShopUuid, document: NewDocument<T>) -> Result<Record<T>, StoreError>;

    /// Insert a batch in one transaction; either every document is written or none is.
    async fn create_many(
        &self,
        shop: ShopUuid,
        documents: Vec<NewDocument<T>>,
    ) -> Result<Vec<Record<T>>, StoreError>;

    /// Replace the payload of a live record, keeping its identifier and creation stamps.
    async fn update(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
        update: DocumentUpdate<T>,
    ) -> Result<Record<T>, StoreError>;

    /// Soft-delete a live record and return its final snapshot.
    async fn soft_delete(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
        actor: &str,
        at: Timestamp,
    ) -> Result<Record<T>, StoreError>;

    /// Soft-delete every live record among `guids`; unknown or already deleted ones are skipped.
    async fn soft_delete_many(
        &self,
        shop: ShopUuid,
        guids: &[GuidFixed<T>],
        actor: &str,
        at: Timestamp,
    ) -> Result<Vec<Record<T>>, StoreError>;
}

/// Lookups over live records.
#[async_trait]
pub trait DocumentFinder<T: Entity>: Send + Sync {
    async fn find_by_guid(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
    ) -> Result<Option<Record<T>>, StoreError>;

    async fn find_by_natural_key(
        &self,
        shop: ShopUuid,
        key: &str,
    ) -> Result<Option<Record<T>>, StoreError>;

    async fn find_by_natural_keys(
        &self,
        shop: ShopUuid,
        keys: &[String],
    ) -> Result<Vec<Record<T>>, StoreError>;

    /// One window of matching live records and the total number of matches.
    async fn search(
        &self,
        shop: ShopUuid,
        query: &SearchQuery,
        window: Window,
    ) -> Result<(Vec<Record<T>>, u64), StoreError>;
}

/// Delta queries.
#[async_trait]
pub trait ActivityFinder<T: Entity>: Send + Sync {
    /// Live records created or updated at or after `since`.
    async fn find_activity_since(
        &self,
        shop: ShopUuid,
        since: Timestamp,
        filters: &Filters,
        window: Window,
    ) -> Result<(Vec<Record<T>>, u64), StoreError>;

    /// Records soft-deleted at or after `since`.
    async fn find_deleted_since(
        &self,
        shop: ShopUuid,
        since: Timestamp,
        filters: &Filters,
        window: Window,
    ) -> Result<(Vec<DeleteActivityRecord<T>>, u64), StoreError>;
}
