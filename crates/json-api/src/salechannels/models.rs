//! Sale Channel Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopsync::records::{DeleteActivityRecord, Record};
use shopsync_app::salechannels::SaleChannel;

/// Sale channel payload accepted by create, update and bulk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SaleChannelRequest {
    /// Unique code within the shop
    pub code: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Gross-profit figure
    #[serde(default)]
    pub gp: f64,

    /// Gross-profit calculation type
    #[serde(default)]
    pub gp_type: i64,

    /// Channel image
    #[serde(default)]
    pub image_uri: Option<String>,
}

impl From<SaleChannelRequest> for SaleChannel {
    fn from(request: SaleChannelRequest) -> Self {
        SaleChannel {
            code: request.code,
            name: request.name,
            gp: request.gp,
            gp_type: request.gp_type,
            image_uri: request.image_uri,
        }
    }
}

/// Live sale channel.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SaleChannelResponse {
    pub shop_id: Uuid,
    pub guid_fixed: Uuid,
    pub code: String,
    pub name: String,
    pub gp: f64,
    pub gp_type: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    pub created_at: String,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl From<Record<SaleChannel>> for SaleChannelResponse {
    fn from(record: Record<SaleChannel>) -> Self {
        Self {
            shop_id: record.shop.into_uuid(),
            guid_fixed: record.guid.into_uuid(),
            code: record.data.code,
            name: record.data.name,
            gp: record.data.gp,
            gp_type: record.data.gp_type,
            image_uri: record.data.image_uri,
            created_at: record.audit.created_at.to_string(),
            created_by: record.audit.created_by,
            updated_at: record.audit.updated_at.map(|at| at.to_string()),
            updated_by: record.audit.updated_by,
        }
    }
}

/// Sale channel removed since the caller's watermark.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemovedSaleChannelResponse {
    pub shop_id: Uuid,
    pub guid_fixed: Uuid,
    pub deleted_at: String,
    pub deleted_by: String,
}

impl From<DeleteActivityRecord<SaleChannel>> for RemovedSaleChannelResponse {
    fn from(record: DeleteActivityRecord<SaleChannel>) -> Self {
        Self {
            shop_id: record.shop.into_uuid(),
            guid_fixed: record.guid.into_uuid(),
            deleted_at: record.deleted_at.to_string(),
            deleted_by: record.deleted_by,
        }
    }
}
