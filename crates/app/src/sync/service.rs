//! Records service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::debug;

use shopsync::{
    bulk::BulkImport,
    delta::{DeltaPage, DeltaQuery},
    query::{Listing, Paging, SearchQuery},
    records::{DocumentUpdate, Entity, NewDocument, Record},
    topics::Operation,
    uuids::{GuidFixed, ShopUuid},
};

use crate::{
    events::EventPublisher,
    mastersync::MasterSyncNotifier,
    store::{ActivityFinder, DocumentFinder, DocumentWriter, PgDocumentStore},
    sync::{BulkReconciler, DeltaFeedService, RecordsServiceError},
};

/// Records service for one module backed by the shared document store.
pub type PgRecordsService<T> = ModuleRecordsService<T, PgDocumentStore<T>>;

/// CRUD, search, bulk import and delta feed for one entity module.
///
/// Every successful mutation publishes its snapshot and touches the module's
/// master-sync marker in the background.
pub struct ModuleRecordsService<T, S> {
    store: Arc<S>,
    publisher: EventPublisher,
    notifier: MasterSyncNotifier,
    delta: DeltaFeedService<T, S>,
    bulk: BulkReconciler<T, S>,
}

impl<T, S> Clone for ModuleRecordsService<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            publisher: self.publisher.clone(),
            notifier: self.notifier.clone(),
            delta: self.delta.clone(),
            bulk: self.bulk.clone(),
        }
    }
}

impl<T, S> ModuleRecordsService<T, S>
where
    T: Entity,
    S: DocumentWriter<T> + DocumentFinder<T> + ActivityFinder<T>,
{
    #[must_use]
    pub fn new(store: S, publisher: EventPublisher, notifier: MasterSyncNotifier) -> Self {
        let store = Arc::new(store);

        Self {
            delta: DeltaFeedService::new(Arc::clone(&store)),
            bulk: BulkReconciler::new(Arc::clone(&store), publisher.clone(), notifier.clone()),
            store,
            publisher,
            notifier,
        }
    }

    fn announce(&self, shop: ShopUuid, operation: Operation, snapshot: &Record<T>) {
        self.publisher.publish(operation, snapshot);
        self.notifier.save(shop, T::MODULE);
    }
}

#[async_trait]
impl<T, S> RecordsService<T> for ModuleRecordsService<T, S>
where
    T: Entity,
    S: DocumentWriter<T> + DocumentFinder<T> + ActivityFinder<T> + 'static,
{
    async fn create(
        &self,
        shop: ShopUuid,
        actor: String,
        data: T,
    ) -> Result<Record<T>, RecordsServiceError> {
        data.validate()?;

        if self
            .store
            .find_by_natural_key(shop, data.natural_key())
            .await?
            .is_some()
        {
            return Err(RecordsServiceError::DuplicateKey);
        }

        let record = self
            .store
            .create(shop, NewDocument::stamp(data, Timestamp::now(), actor))
            .await?;

        self.announce(shop, Operation::Created, &record);

        Ok(record)
    }

    async fn update(
        &self,
        shop: ShopUuid,
        actor: String,
        guid: GuidFixed<T>,
        data: T,
    ) -> Result<Record<T>, RecordsServiceError> {
        data.validate()?;

        let record = self
            .store
            .update(
                shop,
                guid,
                DocumentUpdate {
                    data,
                    updated_at: Timestamp::now(),
                    updated_by: actor,
                },
            )
            .await?;

        self.announce(shop, Operation::Updated, &record);

        Ok(record)
    }

    async fn delete(
        &self,
        shop: ShopUuid,
        actor: String,
        guid: GuidFixed<T>,
    ) -> Result<(), RecordsServiceError> {
        let record = self
            .store
            .soft_delete(shop, guid, &actor, Timestamp::now())
            .await?;

        self.announce(shop, Operation::Deleted, &record);

        Ok(())
    }

    async fn delete_many(
        &self,
        shop: ShopUuid,
        actor: String,
        guids: Vec<GuidFixed<T>>,
    ) -> Result<u64, RecordsServiceError> {
        let deleted = self
            .store
            .soft_delete_many(shop, &guids, &actor, Timestamp::now())
            .await?;

        debug!(
            module = T::MODULE,
            requested = guids.len(),
            deleted = deleted.len(),
            "bulk delete"
        );

        if !deleted.is_empty() {
            self.publisher.publish_bulk(Operation::BulkDeleted, &deleted);
            self.notifier.save(shop, T::MODULE);
        }

        Ok(deleted.len() as u64)
    }

    async fn info(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
    ) -> Result<Record<T>, RecordsServiceError> {
        self.store
            .find_by_guid(shop, guid)
            .await?
            .ok_or(RecordsServiceError::NotFound)
    }

    async fn info_by_code(
        &self,
        shop: ShopUuid,
        code: String,
    ) -> Result<Record<T>, RecordsServiceError> {
        self.store
            .find_by_natural_key(shop, &code)
            .await?
            .ok_or(RecordsServiceError::NotFound)
    }

    async fn search(
        &self,
        shop: ShopUuid,
        query: SearchQuery,
        paging: Paging,
    ) -> Result<Listing<Record<T>>, RecordsServiceError> {
        let (items, total) = self.store.search(shop, &query, paging.window()).await?;

        Ok(Listing {
            items,
            page_info: paging.describe(total),
        })
    }

    async fn import(
        &self,
        shop: ShopUuid,
        actor: String,
        items: Vec<T>,
    ) -> Result<BulkImport, RecordsServiceError> {
        self.bulk.reconcile(shop, &actor, items).await
    }

    async fn delta(
        &self,
        shop: ShopUuid,
        query: DeltaQuery,
    ) -> Result<DeltaPage<T>, RecordsServiceError> {
        Ok(self.delta.fetch(shop, &query).await?)
    }
}

#[automock]
#[async_trait]
pub trait RecordsService<T: Entity>: Send + Sync {
    /// Create a live record. Fails when a live record already holds the natural key.
    async fn create(
        &self,
        shop: ShopUuid,
        actor: String,
        data: T,
    ) -> Result<Record<T>, RecordsServiceError>;

    /// Replace the payload of a live record.
    async fn update(
        &self,
        shop: ShopUuid,
        actor: String,
        guid: GuidFixed<T>,
        data: T,
    ) -> Result<Record<T>, RecordsServiceError>;

    /// Soft-delete a live record.
    async fn delete(
        &self,
        shop: ShopUuid,
        actor: String,
        guid: GuidFixed<T>,
    ) -> Result<(), RecordsServiceError>;

    /// Soft-delete every live record among `guids` and return how many were deleted.
    async fn delete_many(
        &self,
        shop: ShopUuid,
        actor: String,
        guids: Vec<GuidFixed<T>>,
    ) -> Result<u64, RecordsServiceError>;

    /// Fetch a live record by identifier.
    async fn info(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
    ) -> Result<Record<T>, RecordsServiceError>;

    /// Fetch a live record by natural key.
    async fn info_by_code(
        &self,
        shop: ShopUuid,
        code: String,
    ) -> Result<Record<T>, RecordsServiceError>;

    /// Search live records.
    async fn search(
        &self,
        shop: ShopUuid,
        query: SearchQuery,
        paging: Paging,
    ) -> Result<Listing<Record<T>>, RecordsServiceError>;

    /// Reconcile a batch keyed by natural key.
    async fn import(
        &self,
        shop: ShopUuid,
        actor: String,
        items: Vec<T>,
    ) -> Result<BulkImport, RecordsServiceError>;

    /// Records changed since a watermark.
    async fn delta(
        &self,
        shop: ShopUuid,
        query: DeltaQuery,
    ) -> Result<DeltaPage<T>, RecordsServiceError>;
}
