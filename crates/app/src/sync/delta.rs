//! Delta feed service.

use std::{marker::PhantomData, sync::Arc};

use tracing::debug;

use shopsync::{
    delta::{DeltaFeed, DeltaPage, DeltaQuery},
    records::Entity,
    uuids::ShopUuid,
};

use crate::store::{ActivityFinder, StoreError};

/// Answers "what changed since T" for one module.
pub struct DeltaFeedService<T, S> {
    store: Arc<S>,
    entity: PhantomData<fn() -> T>,
}

impl<T, S> Clone for DeltaFeedService<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            entity: PhantomData,
        }
    }
}

impl<T: Entity, S: ActivityFinder<T>> DeltaFeedService<T, S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            entity: PhantomData,
        }
    }

    /// Run the halves `query.action` asks for, concurrently.
    ///
    /// Both halves share one window; the paging metadata describes whichever
    /// half matched more rows.
    ///
    /// # Errors
    ///
    /// Returns the first store error of either half.
    pub async fn fetch(
        &self,
        shop: ShopUuid,
        query: &DeltaQuery,
    ) -> Result<DeltaPage<T>, StoreError> {
        let window = query.paging.window();

        let new = async {
            if !query.action.includes_new() {
                return Ok((Vec::new(), 0));
            }

            self.store
                .find_activity_since(shop, query.since, &query.filters, window)
                .await
        };

        let removed = async {
            if !query.action.includes_removed() {
                return Ok((Vec::new(), 0));
            }

            self.store
                .find_deleted_since(shop, query.since, &query.filters, window)
                .await
        };

        let ((new, new_total), (removed, removed_total)) = tokio::try_join!(new, removed)?;

        debug!(
            module = T::MODULE,
            new = new_total,
            removed = removed_total,
            "delta computed"
        );

        Ok(DeltaPage {
            feed: DeltaFeed { new, removed },
            page_info: query.paging.describe(new_total.max(removed_total)),
        })
    }
}
