//! Delete Sale Channels By Guid Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{extensions::*, salechannels::errors::into_status_error, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DeletedCount {
    /// Records that were live and are now deleted
    pub deleted: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DeleteManyResponse {
    pub success: bool,
    pub data: DeletedCount,
}

/// Delete Sale Channels Handler
///
/// Soft-deletes every live sale channel in the body's `guidFixed` list.
#[endpoint(tags("sale-channel"), summary = "Delete Sale Channels")]
pub(crate) async fn handler(
    json: JsonBody<Vec<Uuid>>,
    depot: &mut Depot,
) -> Result<Json<DeleteManyResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let guids = json.into_inner().into_iter().map(Into::into).collect();

    let deleted = state
        .sale_channels
        .delete_many(identity.shop, identity.username.clone(), guids)
        .await
        .map_err(into_status_error)?;

    Ok(Json(DeleteManyResponse {
        success: true,
        data: DeletedCount { deleted },
    }))
}
