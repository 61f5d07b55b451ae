//! Master-sync marker repository.

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use mockall::automock;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};

use shopsync::uuids::ShopUuid;

use crate::{database::Db, mastersync::MasterSyncError};

const TOUCH_MARKER_SQL: &str = include_str!("sql/touch_marker.sql");
const LIST_MARKERS_SQL: &str = include_str!("sql/list_markers.sql");

/// Last change of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMarker {
    pub module: String,
    pub changed_at: Timestamp,
}

impl<'r> FromRow<'r, PgRow> for SyncMarker {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            module: row.try_get("module")?,
            changed_at: row.try_get::<SqlxTimestamp, _>("changed_at")?.to_jiff(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgMasterSyncRepository {
    db: Db,
}

impl PgMasterSyncRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    async fn upsert(
        &self,
        shop: ShopUuid,
        module: String,
        at: Timestamp,
    ) -> Result<(), MasterSyncError> {
        let mut tx = self.db.begin_shop_transaction(shop).await?;

        query(TOUCH_MARKER_SQL)
            .bind(shop.into_uuid())
            .bind(module)
            .bind(SqlxTimestamp::from(at))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn list(&self, shop: ShopUuid) -> Result<Vec<SyncMarker>, MasterSyncError> {
        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let markers = query_as::<Postgres, SyncMarker>(LIST_MARKERS_SQL)
            .bind(shop.into_uuid())
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(markers)
    }
}

#[async_trait]
impl MasterSyncRepository for PgMasterSyncRepository {
    async fn touch(
        &self,
        shop: ShopUuid,
        module: String,
        at: Timestamp,
    ) -> Result<(), MasterSyncError> {
        self.db.bounded(self.upsert(shop, module, at)).await
    }

    async fn markers(&self, shop: ShopUuid) -> Result<Vec<SyncMarker>, MasterSyncError> {
        self.db.bounded(self.list(shop)).await
    }
}

#[automock]
#[async_trait]
pub trait MasterSyncRepository: Send + Sync {
    /// Move the marker of `(shop, module)` forward to `at`. Older times never win.
    async fn touch(
        &self,
        shop: ShopUuid,
        module: String,
        at: Timestamp,
    ) -> Result<(), MasterSyncError>;

    /// Every marker of `shop`, ordered by module.
    async fn markers(&self, shop: ShopUuid) -> Result<Vec<SyncMarker>, MasterSyncError>;
}
