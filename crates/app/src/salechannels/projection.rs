//! Sale channel projection row.

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Row, postgres::PgRow};

use shopsync::{
    projection::{Column, ColumnValue, ProjectionRow},
    records::Record,
    uuids::{GuidFixed, ShopUuid},
};

use crate::salechannels::SaleChannel;

#[derive(Debug, Clone, PartialEq)]
pub struct SaleChannelRow {
    pub shop: ShopUuid,
    pub guid: GuidFixed<SaleChannel>,
    pub code: String,
    pub name: Option<String>,
    pub gp: Option<f64>,
    pub gp_type: Option<i64>,
    pub image_uri: Option<String>,
    pub version: Timestamp,
}

impl ProjectionRow for SaleChannelRow {
    type Source = SaleChannel;

    const TABLE: &'static str = "sale_channel_projections";

    fn project(record: &Record<SaleChannel>) -> Self {
        Self {
            shop: record.shop,
            guid: record.guid,
            code: record.data.code.clone(),
            name: Some(record.data.name.clone()),
            gp: Some(record.data.gp),
            gp_type: Some(record.data.gp_type),
            image_uri: record.data.image_uri.clone(),
            version: record.audit.last_activity(),
        }
    }

    fn shop(&self) -> ShopUuid {
        self.shop
    }

    fn guid(&self) -> GuidFixed<SaleChannel> {
        self.guid
    }

    fn version(&self) -> Timestamp {
        self.version
    }

    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new("shop_id", ColumnValue::Uuid(self.shop.into_uuid())),
            Column::new("guid_fixed", ColumnValue::Uuid(self.guid.into_uuid())),
            Column::new("code", ColumnValue::Text(Some(self.code.clone()))),
            Column::new("name", ColumnValue::Text(self.name.clone())),
            Column::new("gp", ColumnValue::Float(self.gp)),
            Column::new("gp_type", ColumnValue::Integer(self.gp_type)),
            Column::new("image_uri", ColumnValue::Text(self.image_uri.clone())),
            Column::new("version", ColumnValue::Timestamp(Some(self.version))),
        ]
    }
}

impl<'r> FromRow<'r, PgRow> for SaleChannelRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            shop: ShopUuid::from_uuid(row.try_get("shop_id")?),
            guid: GuidFixed::from_uuid(row.try_get("guid_fixed")?),
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            gp: row.try_get("gp")?,
            gp_type: row.try_get("gp_type")?,
            image_uri: row.try_get("image_uri")?,
            version: row.try_get::<SqlxTimestamp, _>("version")?.to_jiff(),
        })
    }
}

#[cfg(test)]
mod tests {
    use jiff::ToSpan;
    use testresult::TestResult;

    use shopsync::{records::Audit, topics::TopicScheme};

    use crate::{
        projection::{Outcome, PgProjectionStore, ProjectionHandler, ProjectionStore},
        test::TestContext,
    };

    use super::*;

    fn record(shop: ShopUuid, name: &str, at: Timestamp) -> Record<SaleChannel> {
        Record {
            shop,
            guid: GuidFixed::new(),
            data: SaleChannel {
                code: "GRAB".to_string(),
                name: name.to_string(),
                gp: 30.0,
                gp_type: 1,
                image_uri: None,
            },
            audit: Audit::created(at, "alice"),
        }
    }

    #[tokio::test]
    async fn projection_round_trip_against_postgres() -> TestResult {
        let ctx = TestContext::new().await;
        let handler = ProjectionHandler::new(
            PgProjectionStore::<SaleChannelRow>::new(ctx.app_db.clone()),
            TopicScheme::default(),
        );
        let at = Timestamp::from_second(1_700_000_000)?;
        let mut snapshot = record(ctx.shop, "Grab", at);

        assert_eq!(
            handler.upsert(&SaleChannelRow::project(&snapshot)).await?,
            Outcome::Inserted
        );
        assert_eq!(
            handler.upsert(&SaleChannelRow::project(&snapshot)).await?,
            Outcome::Unchanged
        );

        snapshot.data.name = "Grab Food".to_string();
        snapshot.audit.updated_at = Some(at.checked_add(1.minute())?);

        assert_eq!(
            handler.upsert(&SaleChannelRow::project(&snapshot)).await?,
            Outcome::Updated
        );

        let stored = handler.store().get(ctx.shop, snapshot.guid).await?;

        assert_eq!(stored.and_then(|row| row.name).as_deref(), Some("Grab Food"));

        snapshot.audit.updated_at = Some(at);
        snapshot.data.name = "Stale".to_string();

        assert_eq!(
            handler.upsert(&SaleChannelRow::project(&snapshot)).await?,
            Outcome::Stale
        );
        assert_eq!(
            handler.remove(ctx.shop, snapshot.guid).await?,
            Outcome::Removed
        );

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_insert_reports_already_exists() -> TestResult {
        let ctx = TestContext::new().await;
        let store = PgProjectionStore::<SaleChannelRow>::new(ctx.app_db.clone());
        let row = SaleChannelRow::project(&record(ctx.shop, "Grab", Timestamp::now()));

        store.insert(&row).await?;

        assert!(matches!(
            store.insert(&row).await,
            Err(crate::projection::ProjectionError::AlreadyExists)
        ));

        Ok(())
    }
}
