//! Projection event handler.

use std::marker::PhantomData;

use tracing::{debug, warn};

use shopsync::{
    projection::{ProjectionRow, dirty_check},
    records::{Entity, Record},
    topics::TopicScheme,
    uuids::{GuidFixed, ShopUuid},
};

use crate::projection::{ProjectionError, ProjectionStore};

/// What applying one snapshot did to the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Inserted,
    Updated,
    /// Stored row already matched the snapshot.
    Unchanged,
    /// Stored row is newer than the snapshot.
    Stale,
    Removed,
    AlreadyAbsent,
}

/// Applies change events of `R::Source` to a projection store.
pub struct ProjectionHandler<R, S> {
    store: S,
    topics: TopicScheme,
    row: PhantomData<fn() -> R>,
}

impl<R, S> ProjectionHandler<R, S>
where
    R: ProjectionRow,
    S: ProjectionStore<R>,
{
    #[must_use]
    pub fn new(store: S, topics: TopicScheme) -> Self {
        Self {
            store,
            topics,
            row: PhantomData,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply the message received on `subject`.
    ///
    /// Bulk messages are applied item by item; a failing item is logged and
    /// skipped so the rest of the batch still lands.
    ///
    /// # Errors
    ///
    /// Returns an error when the subject belongs to another module, the payload
    /// cannot be decoded, or a single-record write fails.
    pub async fn handle(
        &self,
        subject: &str,
        payload: &[u8],
    ) -> Result<Vec<Outcome>, ProjectionError> {
        let module = R::Source::MODULE;

        let operation = match self.topics.parse(subject) {
            Some((subject_module, operation)) if subject_module == module => operation,
            _ => return Err(ProjectionError::UnexpectedSubject(subject.to_string())),
        };

        if !operation.is_bulk() {
            let snapshot: Record<R::Source> = serde_json::from_slice(payload)?;

            let outcome = if operation.is_delete() {
                self.remove(snapshot.shop, snapshot.guid).await?
            } else {
                self.upsert(&R::project(&snapshot)).await?
            };

            return Ok(vec![outcome]);
        }

        let snapshots: Vec<Record<R::Source>> = serde_json::from_slice(payload)?;
        let mut outcomes = Vec::with_capacity(snapshots.len());

        for snapshot in &snapshots {
            let applied = if operation.is_delete() {
                self.remove(snapshot.shop, snapshot.guid).await
            } else {
                self.upsert(&R::project(snapshot)).await
            };

            match applied {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => {
                    warn!(
                        module,
                        guid = %snapshot.guid,
                        "failed to apply bulk item: {error}"
                    );
                }
            }
        }

        Ok(outcomes)
    }

    /// Insert or update the row built from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns the store error of the failing read or write.
    pub async fn upsert(&self, incoming: &R) -> Result<Outcome, ProjectionError> {
        let Some(stored) = self.store.get(incoming.shop(), incoming.guid()).await? else {
            match self.store.insert(incoming).await {
                Ok(()) => return Ok(Outcome::Inserted),
                Err(ProjectionError::AlreadyExists) => {
                    debug!(
                        table = R::TABLE,
                        guid = %incoming.guid(),
                        "row appeared concurrently, comparing instead"
                    );
                }
                Err(error) => return Err(error),
            }

            return match self.store.get(incoming.shop(), incoming.guid()).await? {
                Some(stored) => self.reconcile(incoming, &stored).await,
                None => {
                    self.store.insert(incoming).await?;
                    Ok(Outcome::Inserted)
                }
            };
        };

        self.reconcile(incoming, &stored).await
    }

    async fn reconcile(&self, incoming: &R, stored: &R) -> Result<Outcome, ProjectionError> {
        if incoming.version() < stored.version() {
            debug!(table = R::TABLE, guid = %incoming.guid(), "skipping stale snapshot");
            return Ok(Outcome::Stale);
        }

        let changes = dirty_check(incoming, stored);

        if changes.is_empty() {
            return Ok(Outcome::Unchanged);
        }

        debug!(
            table = R::TABLE,
            guid = %incoming.guid(),
            columns = ?changes.names(),
            "updating projection row"
        );

        if self.store.update(incoming, &changes).await? {
            Ok(Outcome::Updated)
        } else {
            Ok(Outcome::Stale)
        }
    }

    /// Remove the row of a deleted record.
    ///
    /// # Errors
    ///
    /// Returns the store error of the failing delete.
    pub async fn remove(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<R::Source>,
    ) -> Result<Outcome, ProjectionError> {
        if self.store.delete(shop, guid).await? {
            Ok(Outcome::Removed)
        } else {
            Ok(Outcome::AlreadyAbsent)
        }
    }
}
