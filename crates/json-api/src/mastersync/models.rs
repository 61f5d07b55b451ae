//! Master Sync Models

use std::collections::BTreeMap;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shopsync_app::{mastersync::SyncMarker, sync::MasterSyncFeed};

use crate::envelope::{PaginationResponse, paging_fields};

/// Changes of every selected module, keyed by lowercased module name.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MasterSyncResponse {
    pub success: bool,
    #[salvo(schema(value_type = Object))]
    pub data: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl From<MasterSyncFeed> for MasterSyncResponse {
    fn from(feed: MasterSyncFeed) -> Self {
        let (pagination, total) = feed.page_info.map(paging_fields).unwrap_or_default();

        Self {
            success: true,
            data: feed.modules,
            pagination,
            total,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SyncMarkerResponse {
    pub module: String,
    pub changed_at: String,
}

impl From<SyncMarker> for SyncMarkerResponse {
    fn from(marker: SyncMarker) -> Self {
        Self {
            module: marker.module,
            changed_at: marker.changed_at.to_string(),
        }
    }
}

/// Last change time per module.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SyncStatusResponse {
    pub success: bool,
    pub data: Vec<SyncMarkerResponse>,
}
