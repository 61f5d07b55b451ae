//! Projection storage.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    marker::PhantomData,
};

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, QueryBuilder, postgres::PgRow, query, query_as};

use shopsync::{
    projection::{ChangeSet, ColumnValue, ProjectionRow},
    uuids::{GuidFixed, ShopUuid},
};

use crate::{database::Db, projection::ProjectionError};

#[async_trait]
pub trait ProjectionStore<R: ProjectionRow>: Send + Sync {
    /// Stored row of a record, if any.
    async fn get(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<R::Source>,
    ) -> Result<Option<R>, ProjectionError>;

    /// Insert a new row; fails with [`ProjectionError::AlreadyExists`] when one is already stored.
    async fn insert(&self, row: &R) -> Result<(), ProjectionError>;

    /// Write `changes` to the stored row unless it already holds a newer version.
    ///
    /// Returns whether a row was written.
    async fn update(&self, row: &R, changes: &ChangeSet) -> Result<bool, ProjectionError>;

    /// Remove a row; returns whether one existed.
    async fn delete(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<R::Source>,
    ) -> Result<bool, ProjectionError>;
}

/// Projection rows in their own table, `R::TABLE`.
pub struct PgProjectionStore<R> {
    db: Db,
    row: PhantomData<fn() -> R>,
}

impl<R> Clone for PgProjectionStore<R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            row: PhantomData,
        }
    }
}

impl<R: ProjectionRow> Debug for PgProjectionStore<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PgProjectionStore")
            .field("table", &R::TABLE)
            .finish_non_exhaustive()
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: ColumnValue) {
    match value {
        ColumnValue::Uuid(value) => builder.push_bind(value),
        ColumnValue::Text(value) => builder.push_bind(value),
        ColumnValue::Integer(value) => builder.push_bind(value),
        ColumnValue::Float(value) => builder.push_bind(value),
        ColumnValue::Boolean(value) => builder.push_bind(value),
        ColumnValue::Timestamp(value) => builder.push_bind(value.map(SqlxTimestamp::from)),
    };
}

impl<R> PgProjectionStore<R>
where
    R: ProjectionRow + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            row: PhantomData,
        }
    }

    async fn select(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<R::Source>,
    ) -> Result<Option<R>, ProjectionError> {
        let sql = format!(
            "SELECT * FROM {} WHERE shop_id = $1 AND guid_fixed = $2",
            R::TABLE
        );

        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let row = query_as::<Postgres, R>(&sql)
            .bind(shop.into_uuid())
            .bind(guid.into_uuid())
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row)
    }

    async fn insert_row(&self, row: &R) -> Result<(), ProjectionError> {
        let columns = row.columns();
        let names: Vec<&str> = columns.iter().map(|column| column.name).collect();

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            R::TABLE,
            names.join(", ")
        ));

        for (index, column) in columns.into_iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }

            push_value(&mut builder, column.value);
        }

        builder.push(") ON CONFLICT DO NOTHING");

        let mut tx = self.db.begin_shop_transaction(row.shop()).await?;

        let inserted = builder.build().execute(&mut *tx).await?.rows_affected();

        tx.commit().await?;

        if inserted == 0 {
            return Err(ProjectionError::AlreadyExists);
        }

        Ok(())
    }

    async fn update_row(&self, row: &R, changes: &ChangeSet) -> Result<bool, ProjectionError> {
        if changes.is_empty() {
            return Ok(false);
        }

        let mut builder = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", R::TABLE));

        for (index, column) in changes.iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }

            builder.push(column.name).push(" = ");
            push_value(&mut builder, column.value.clone());
        }

        builder
            .push(" WHERE shop_id = ")
            .push_bind(row.shop().into_uuid())
            .push(" AND guid_fixed = ")
            .push_bind(row.guid().into_uuid())
            .push(" AND version <= ")
            .push_bind(SqlxTimestamp::from(row.version()));

        let mut tx = self.db.begin_shop_transaction(row.shop()).await?;

        let updated = builder.build().execute(&mut *tx).await?.rows_affected();

        tx.commit().await?;

        Ok(updated > 0)
    }

    async fn delete_row(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<R::Source>,
    ) -> Result<bool, ProjectionError> {
        let sql = format!(
            "DELETE FROM {} WHERE shop_id = $1 AND guid_fixed = $2",
            R::TABLE
        );

        let mut tx = self.db.begin_shop_transaction(shop).await?;

        let deleted = query(&sql)
            .bind(shop.into_uuid())
            .bind(guid.into_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(deleted > 0)
    }
}

#[async_trait]
impl<R> ProjectionStore<R> for PgProjectionStore<R>
where
    R: ProjectionRow + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    async fn get(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<R::Source>,
    ) -> Result<Option<R>, ProjectionError> {
        self.db.bounded(self.select(shop, guid)).await
    }

    async fn insert(&self, row: &R) -> Result<(), ProjectionError> {
        self.db.bounded(self.insert_row(row)).await
    }

    async fn update(&self, row: &R, changes: &ChangeSet) -> Result<bool, ProjectionError> {
        self.db.bounded(self.update_row(row, changes)).await
    }

    async fn delete(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<R::Source>,
    ) -> Result<bool, ProjectionError> {
        self.db.bounded(self.delete_row(shop, guid)).await
    }
}
