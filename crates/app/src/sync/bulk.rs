//! Bulk reconciliation.

use std::{marker::PhantomData, sync::Arc};

use jiff::Timestamp;
use rustc_hash::FxHashSet;
use tracing::{info, warn};

use shopsync::{
    bulk::{BulkImport, BulkPlan, dedup_first_seen},
    records::{DocumentUpdate, Entity, NewDocument, Record},
    topics::Operation,
    uuids::{GuidFixed, ShopUuid},
};

use crate::{
    events::EventPublisher,
    mastersync::MasterSyncNotifier,
    store::{DocumentFinder, DocumentWriter, StoreError},
    sync::RecordsServiceError,
};

/// Imports a batch of entities keyed by natural key.
///
/// New keys are inserted together in one transaction, existing keys are
/// overwritten one by one. Every input item is reported in exactly one of the
/// four outcome lists; per-item update failures never abort the import.
pub struct BulkReconciler<T, S> {
    store: Arc<S>,
    publisher: EventPublisher,
    notifier: MasterSyncNotifier,
    entity: PhantomData<fn() -> T>,
}

impl<T, S> Clone for BulkReconciler<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            publisher: self.publisher.clone(),
            notifier: self.notifier.clone(),
            entity: PhantomData,
        }
    }
}

impl<T, S> BulkReconciler<T, S>
where
    T: Entity,
    S: DocumentWriter<T> + DocumentFinder<T>,
{
    #[must_use]
    pub fn new(store: Arc<S>, publisher: EventPublisher, notifier: MasterSyncNotifier) -> Self {
        Self {
            store,
            publisher,
            notifier,
            entity: PhantomData,
        }
    }

    /// Reconcile `items` against the live records of `shop`.
    ///
    /// # Errors
    ///
    /// Returns a validation error before anything is written when an item is
    /// malformed, or a store error when the existence lookup or the batch
    /// insert fails.
    pub async fn reconcile(
        &self,
        shop: ShopUuid,
        actor: &str,
        items: Vec<T>,
    ) -> Result<BulkImport, RecordsServiceError> {
        for item in &items {
            item.validate()?;
        }

        let (unique, duplicates) = dedup_first_seen(items, T::natural_key);

        let mut report = BulkImport {
            payload_duplicate: duplicates
                .iter()
                .map(|item| item.natural_key().to_owned())
                .collect(),
            ..BulkImport::default()
        };

        let keys: Vec<String> = unique
            .iter()
            .map(|item| item.natural_key().to_owned())
            .collect();

        let existing: FxHashSet<String> = self
            .store
            .find_by_natural_keys(shop, &keys)
            .await?
            .iter()
            .map(|record| record.natural_key().to_owned())
            .collect();

        let plan = BulkPlan::classify(unique, &existing, T::natural_key);
        let now = Timestamp::now();

        let staged = self.stage_updates(shop, plan.update, &mut report).await;
        let created = self
            .insert_new(shop, actor, now, plan.create, &mut report)
            .await?;
        let updated = self.apply_updates(shop, actor, now, staged, &mut report).await;

        report.created = created
            .iter()
            .map(|record| record.natural_key().to_owned())
            .collect();

        self.publisher.publish_bulk(Operation::BulkCreated, &created);
        self.publisher.publish_bulk(Operation::BulkUpdated, &updated);
        self.notifier.save(shop, T::MODULE);

        info!(
            module = T::MODULE,
            created = report.created.len(),
            updated = report.updated.len(),
            update_failed = report.update_failed.len(),
            payload_duplicate = report.payload_duplicate.len(),
            "bulk import reconciled"
        );

        Ok(report)
    }

    /// Re-fetch each existing record so the update targets its current identifier.
    async fn stage_updates(
        &self,
        shop: ShopUuid,
        items: Vec<T>,
        report: &mut BulkImport,
    ) -> Vec<(GuidFixed<T>, T)> {
        let mut staged = Vec::with_capacity(items.len());

        for item in items {
            match self.store.find_by_natural_key(shop, item.natural_key()).await {
                Ok(Some(current)) => staged.push((current.guid, item)),
                Ok(None) => {
                    warn!(
                        module = T::MODULE,
                        key = item.natural_key(),
                        "record disappeared before bulk update"
                    );
                    report.update_failed.push(item.natural_key().to_owned());
                }
                Err(error) => {
                    warn!(
                        module = T::MODULE,
                        key = item.natural_key(),
                        "failed to load record for bulk update: {error}"
                    );
                    report.update_failed.push(item.natural_key().to_owned());
                }
            }
        }

        staged
    }

    /// Insert new keys in one batch.
    ///
    /// When other writers created some of the keys after the existence lookup,
    /// those keys are reported as failed updates and the rest is inserted
    /// again, until a batch goes through or nothing is left.
    async fn insert_new(
        &self,
        shop: ShopUuid,
        actor: &str,
        now: Timestamp,
        items: Vec<T>,
        report: &mut BulkImport,
    ) -> Result<Vec<Record<T>>, RecordsServiceError> {
        let mut pending: Vec<NewDocument<T>> = items
            .into_iter()
            .map(|data| NewDocument::stamp(data, now, actor))
            .collect();

        while !pending.is_empty() {
            match self.store.create_many(shop, pending.clone()).await {
                Ok(created) => return Ok(created),
                Err(StoreError::DuplicateKey) => {}
                Err(error) => return Err(error.into()),
            }

            let keys: Vec<String> = pending
                .iter()
                .map(|document| document.data.natural_key().to_owned())
                .collect();

            let taken: FxHashSet<String> = self
                .store
                .find_by_natural_keys(shop, &keys)
                .await?
                .iter()
                .map(|record| record.natural_key().to_owned())
                .collect();

            // A conflict nobody can see leaves nothing to retry with.
            let (lost, remaining): (Vec<_>, Vec<_>) = if taken.is_empty() {
                (pending, Vec::new())
            } else {
                pending
                    .into_iter()
                    .partition(|document| taken.contains(document.data.natural_key()))
            };

            warn!(
                module = T::MODULE,
                lost = lost.len(),
                remaining = remaining.len(),
                "bulk insert raced with another writer"
            );

            report.update_failed.extend(
                lost.iter()
                    .map(|document| document.data.natural_key().to_owned()),
            );

            pending = remaining;
        }

        Ok(Vec::new())
    }

    async fn apply_updates(
        &self,
        shop: ShopUuid,
        actor: &str,
        now: Timestamp,
        staged: Vec<(GuidFixed<T>, T)>,
        report: &mut BulkImport,
    ) -> Vec<Record<T>> {
        let mut updated = Vec::with_capacity(staged.len());

        for (guid, data) in staged {
            let key = data.natural_key().to_owned();

            let update = DocumentUpdate {
                data,
                updated_at: now,
                updated_by: actor.to_owned(),
            };

            match self.store.update(shop, guid, update).await {
                Ok(record) => {
                    report.updated.push(key);
                    updated.push(record);
                }
                Err(error) => {
                    warn!(module = T::MODULE, key = %key, "bulk update failed: {error}");
                    report.update_failed.push(key);
                }
            }
        }

        updated
    }
}
