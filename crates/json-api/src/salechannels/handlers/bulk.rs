//! Bulk Import Sale Channels Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use shopsync::bulk::BulkImport;

use crate::{
    extensions::*,
    salechannels::{errors::into_status_error, models::SaleChannelRequest},
    state::State,
};

/// Codes per outcome; every submitted code lands in exactly one list.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BulkImportOutcome {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub update_failed: Vec<String>,
    pub payload_duplicate: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BulkImportResponse {
    pub success: bool,
    pub data: BulkImportOutcome,
}

impl From<BulkImport> for BulkImportResponse {
    fn from(import: BulkImport) -> Self {
        Self {
            success: true,
            data: BulkImportOutcome {
                created: import.created,
                updated: import.updated,
                update_failed: import.update_failed,
                payload_duplicate: import.payload_duplicate,
            },
        }
    }
}

/// Bulk Import Sale Channels Handler
///
/// Creates unknown codes and updates known ones. Repeated codes in the payload
/// are reported as `payloadDuplicate`; the first occurrence wins.
#[endpoint(
    tags("sale-channel"),
    summary = "Bulk Import Sale Channels",
    responses(
        (status_code = StatusCode::CREATED, description = "Batch reconciled"),
        (status_code = StatusCode::BAD_REQUEST, description = "An item failed validation"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<Vec<SaleChannelRequest>>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<BulkImportResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let items = json.into_inner().into_iter().map(Into::into).collect();

    let import = state
        .sale_channels
        .import(identity.shop, identity.username.clone(), items)
        .await
        .map_err(into_status_error)?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(import.into()))
}
