//! Postgres change-tracking store

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    marker::PhantomData,
};

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use serde_json::Value;
use sqlx::{
    FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar, types::Json,
};
use uuid::Uuid;

use shopsync::{
    query::{Filters, SearchQuery, Window},
    records::{Audit, DeleteActivityRecord, DocumentUpdate, Entity, NewDocument, Record},
    uuids::{GuidFixed, ShopUuid},
};

use crate::{
    database::Db,
    store::{ActivityFinder, DocumentFinder, DocumentWriter, StoreError},
};

const CREATE_DOCUMENT_SQL: &str = include_str!("sql/create_document.sql");
const UPDATE_DOCUMENT_SQL: &str = include_str!("sql/update_document.sql");
const SOFT_DELETE_DOCUMENT_SQL: &str = include_str!("sql/soft_delete_document.sql");
const SOFT_DELETE_DOCUMENTS_SQL: &str = include_str!("sql/soft_delete_documents.sql");
const FIND_DOCUMENT_BY_GUID_SQL: &str = include_str!("sql/find_document_by_guid.sql");
const FIND_DOCUMENT_BY_NATURAL_KEY_SQL: &str = include_str!("sql/find_document_by_natural_key.sql");
const FIND_DOCUMENTS_BY_NATURAL_KEYS_SQL: &str =
    include_str!("sql/find_documents_by_natural_keys.sql");
const SEARCH_DOCUMENTS_SQL: &str = include_str!("sql/search_documents.sql");
const COUNT_DOCUMENTS_SQL: &str = include_str!("sql/count_documents.sql");
const FIND_ACTIVITY_SINCE_SQL: &str = include_str!("sql/find_activity_since.sql");
const COUNT_ACTIVITY_SINCE_SQL: &str = include_str!("sql/count_activity_since.sql");
const FIND_DELETED_SINCE_SQL: &str = include_str!("sql/find_deleted_since.sql");
const COUNT_DELETED_SINCE_SQL: &str = include_str!("sql/count_deleted_since.sql");

/// Stores every module in the shared `documents` table, partitioned by `T::MODULE`.
pub struct PgDocumentStore<T> {
    db: Db,
    entity: PhantomData<fn() -> T>,
}

impl<T> Clone for PgDocumentStore<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            entity: PhantomData,
        }
    }
}

impl<T: Entity> Debug for PgDocumentStore<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PgDocumentStore")
            .field("module", &T::MODULE)
            .finish_non_exhaustive()
    }
}

impl<T: Entity> PgDocumentStore<T> {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            entity: PhantomData,
        }
    }

    async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        shop: ShopUuid,
        document: NewDocument<T>,
    ) -> Result<Record<T>, StoreError> {
        let body = serde_json::to_value(&document.data)?;

        let row = query_as::<Postgres, DocumentRow>(CREATE_DOCUMENT_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(document.guid.into_uuid())
            .bind(document.data.natural_key())
            .bind(Json(body))
            .bind(SqlxTimestamp::from(document.created_at))
            .bind(document.created_by)
            .fetch_one(&mut **tx)
            .await?;

        row.into_record()
    }

    async fn create_one(
        &self,
        shop: ShopUuid,
        document: NewDocument<T>,
    ) -> Result<Record<T>, StoreError> {
        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let record = Self::insert(&mut tx, shop, document).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn create_batch(
        &self,
        shop: ShopUuid,
        documents: Vec<NewDocument<T>>,
    ) -> Result<Vec<Record<T>>, StoreError> {
        let mut tx = self.db.begin_shop_transaction(shop).await?;
        let mut created = Vec::with_capacity(documents.len());

        for document in documents {
            created.push(Self::insert(&mut tx, shop, document).await?);
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn replace(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
        update: DocumentUpdate<T>,
    ) -> Result<Record<T>, StoreError> {
        let body = serde_json::to_value(&update.data)?;
        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let row = query_as::<Postgres, DocumentRow>(UPDATE_DOCUMENT_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(guid.into_uuid())
            .bind(update.data.natural_key())
            .bind(Json(body))
            .bind(SqlxTimestamp::from(update.updated_at))
            .bind(update.updated_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        row.into_record()
    }

    async fn delete_one(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
        actor: &str,
        at: Timestamp,
    ) -> Result<Record<T>, StoreError> {
        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let row = query_as::<Postgres, DocumentRow>(SOFT_DELETE_DOCUMENT_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(guid.into_uuid())
            .bind(SqlxTimestamp::from(at))
            .bind(actor)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        row.into_record()
    }

    async fn delete_batch(
        &self,
        shop: ShopUuid,
        guids: &[GuidFixed<T>],
        actor: &str,
        at: Timestamp,
    ) -> Result<Vec<Record<T>>, StoreError> {
        let guids: Vec<Uuid> = guids.iter().map(|guid| guid.into_uuid()).collect();
        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let rows = query_as::<Postgres, DocumentRow>(SOFT_DELETE_DOCUMENTS_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(&guids)
            .bind(SqlxTimestamp::from(at))
            .bind(actor)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        into_records(rows)
    }

    async fn get_by_guid(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
    ) -> Result<Option<Record<T>>, StoreError> {
        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let row = query_as::<Postgres, DocumentRow>(FIND_DOCUMENT_BY_GUID_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(guid.into_uuid())
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        row.map(DocumentRow::into_record).transpose()
    }

    async fn get_by_natural_key(
        &self,
        shop: ShopUuid,
        key: &str,
    ) -> Result<Option<Record<T>>, StoreError> {
        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let row = query_as::<Postgres, DocumentRow>(FIND_DOCUMENT_BY_NATURAL_KEY_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        row.map(DocumentRow::into_record).transpose()
    }

    async fn get_by_natural_keys(
        &self,
        shop: ShopUuid,
        keys: &[String],
    ) -> Result<Vec<Record<T>>, StoreError> {
        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let rows = query_as::<Postgres, DocumentRow>(FIND_DOCUMENTS_BY_NATURAL_KEYS_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(keys)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        into_records(rows)
    }

    async fn search_live(
        &self,
        shop: ShopUuid,
        query: &SearchQuery,
        window: Window,
    ) -> Result<(Vec<Record<T>>, u64), StoreError> {
        let filters = Json(Value::Object(query.filters.clone()));
        let pattern = query.pattern();
        let fields: Vec<String> = T::SEARCH_FIELDS.iter().map(ToString::to_string).collect();
        let limit = i64::try_from(window.limit)?;
        let offset = i64::try_from(window.offset)?;

        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let total: i64 = query_scalar(COUNT_DOCUMENTS_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(&filters)
            .bind(pattern.as_deref())
            .bind(&fields)
            .fetch_one(&mut *tx)
            .await?;

        let rows = query_as::<Postgres, DocumentRow>(SEARCH_DOCUMENTS_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(&filters)
            .bind(pattern.as_deref())
            .bind(&fields)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((into_records(rows)?, u64::try_from(total)?))
    }

    async fn activity_since(
        &self,
        shop: ShopUuid,
        since: Timestamp,
        filters: &Filters,
        window: Window,
    ) -> Result<(Vec<Record<T>>, u64), StoreError> {
        let filters = Json(Value::Object(filters.clone()));
        let limit = i64::try_from(window.limit)?;
        let offset = i64::try_from(window.offset)?;

        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let total: i64 = query_scalar(COUNT_ACTIVITY_SINCE_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(SqlxTimestamp::from(since))
            .bind(&filters)
            .fetch_one(&mut *tx)
            .await?;

        let rows = query_as::<Postgres, DocumentRow>(FIND_ACTIVITY_SINCE_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(SqlxTimestamp::from(since))
            .bind(&filters)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((into_records(rows)?, u64::try_from(total)?))
    }

    async fn deleted_since(
        &self,
        shop: ShopUuid,
        since: Timestamp,
        filters: &Filters,
        window: Window,
    ) -> Result<(Vec<DeleteActivityRecord<T>>, u64), StoreError> {
        let filters = Json(Value::Object(filters.clone()));
        let limit = i64::try_from(window.limit)?;
        let offset = i64::try_from(window.offset)?;

        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let total: i64 = query_scalar(COUNT_DELETED_SINCE_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(SqlxTimestamp::from(since))
            .bind(&filters)
            .fetch_one(&mut *tx)
            .await?;

        let rows = query_as::<Postgres, DeletedRow>(FIND_DELETED_SINCE_SQL)
            .bind(T::MODULE)
            .bind(shop.into_uuid())
            .bind(SqlxTimestamp::from(since))
            .bind(&filters)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let removed = rows.into_iter().map(DeletedRow::into_record).collect();

        Ok((removed, u64::try_from(total)?))
    }
}

#[async_trait]
impl<T: Entity> DocumentWriter<T> for PgDocumentStore<T> {
    async fn create(
        &self,
        shop: ShopUuid,
        document: NewDocument<T>,
    ) -> Result<Record<T>, StoreError> {
        self.db.bounded(self.create_one(shop, document)).await
    }

    async fn create_many(
        &self,
        shop: ShopUuid,
        documents: Vec<NewDocument<T>>,
    ) -> Result<Vec<Record<T>>, StoreError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        self.db.bounded(self.create_batch(shop, documents)).await
    }

    async fn update(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
        update: DocumentUpdate<T>,
    ) -> Result<Record<T>, StoreError> {
        self.db.bounded(self.replace(shop, guid, update)).await
    }

    async fn soft_delete(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
        actor: &str,
        at: Timestamp,
    ) -> Result<Record<T>, StoreError> {
        self.db.bounded(self.delete_one(shop, guid, actor, at)).await
    }

    async fn soft_delete_many(
        &self,
        shop: ShopUuid,
        guids: &[GuidFixed<T>],
        actor: &str,
        at: Timestamp,
    ) -> Result<Vec<Record<T>>, StoreError> {
        if guids.is_empty() {
            return Ok(Vec::new());
        }

        self.db
            .bounded(self.delete_batch(shop, guids, actor, at))
            .await
    }
}

#[async_trait]
impl<T: Entity> DocumentFinder<T> for PgDocumentStore<T> {
    async fn find_by_guid(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
    ) -> Result<Option<Record<T>>, StoreError> {
        self.db.bounded(self.get_by_guid(shop, guid)).await
    }

    async fn find_by_natural_key(
        &self,
        shop: ShopUuid,
        key: &str,
    ) -> Result<Option<Record<T>>, StoreError> {
        self.db.bounded(self.get_by_natural_key(shop, key)).await
    }

    async fn find_by_natural_keys(
        &self,
        shop: ShopUuid,
        keys: &[String],
    ) -> Result<Vec<Record<T>>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        self.db.bounded(self.get_by_natural_keys(shop, keys)).await
    }

    async fn search(
        &self,
        shop: ShopUuid,
        query: &SearchQuery,
        window: Window,
    ) -> Result<(Vec<Record<T>>, u64), StoreError> {
        self.db.bounded(self.search_live(shop, query, window)).await
    }
}

#[async_trait]
impl<T: Entity> ActivityFinder<T> for PgDocumentStore<T> {
    async fn find_activity_since(
        &self,
        shop: ShopUuid,
        since: Timestamp,
        filters: &Filters,
        window: Window,
    ) -> Result<(Vec<Record<T>>, u64), StoreError> {
        self.db
            .bounded(self.activity_since(shop, since, filters, window))
            .await
    }

    async fn find_deleted_since(
        &self,
        shop: ShopUuid,
        since: Timestamp,
        filters: &Filters,
        window: Window,
    ) -> Result<(Vec<DeleteActivityRecord<T>>, u64), StoreError> {
        self.db
            .bounded(self.deleted_since(shop, since, filters, window))
            .await
    }
}

struct DocumentRow {
    shop_id: Uuid,
    guid_fixed: Uuid,
    body: Value,
    audit: Audit,
}

impl DocumentRow {
    fn into_record<T: Entity>(self) -> Result<Record<T>, StoreError> {
        Ok(Record {
            shop: ShopUuid::from_uuid(self.shop_id),
            guid: GuidFixed::from_uuid(self.guid_fixed),
            data: serde_json::from_value(self.body)?,
            audit: self.audit,
        })
    }
}

fn into_records<T: Entity>(rows: Vec<DocumentRow>) -> Result<Vec<Record<T>>, StoreError> {
    rows.into_iter().map(DocumentRow::into_record).collect()
}

impl<'r> FromRow<'r, PgRow> for DocumentRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            shop_id: row.try_get("shop_id")?,
            guid_fixed: row.try_get("guid_fixed")?,
            body: row.try_get::<Json<Value>, _>("body")?.0,
            audit: Audit {
                created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
                created_by: row.try_get("created_by")?,
                updated_at: row
                    .try_get::<Option<SqlxTimestamp>, _>("updated_at")?
                    .map(SqlxTimestamp::to_jiff),
                updated_by: row.try_get("updated_by")?,
                deleted_at: row
                    .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                    .map(SqlxTimestamp::to_jiff),
                deleted_by: row.try_get("deleted_by")?,
            },
        })
    }
}

struct DeletedRow {
    shop_id: Uuid,
    guid_fixed: Uuid,
    deleted_at: Timestamp,
    deleted_by: String,
}

impl DeletedRow {
    fn into_record<T>(self) -> DeleteActivityRecord<T> {
        DeleteActivityRecord {
            shop: ShopUuid::from_uuid(self.shop_id),
            guid: GuidFixed::from_uuid(self.guid_fixed),
            deleted_at: self.deleted_at,
            deleted_by: self.deleted_by,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for DeletedRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            shop_id: row.try_get("shop_id")?,
            guid_fixed: row.try_get("guid_fixed")?,
            deleted_at: row.try_get::<SqlxTimestamp, _>("deleted_at")?.to_jiff(),
            deleted_by: row
                .try_get::<Option<String>, _>("deleted_by")?
                .unwrap_or_default(),
        })
    }
}
