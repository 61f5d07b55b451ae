//! Get Sale Channel Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    extensions::*,
    salechannels::{errors::into_status_error, models::SaleChannelResponse},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SaleChannelInfoResponse {
    pub success: bool,
    pub data: SaleChannelResponse,
}

/// Get Sale Channel Handler
///
/// Returns a live sale channel by its `guidFixed`.
#[endpoint(tags("sale-channel"), summary = "Get Sale Channel")]
pub(crate) async fn handler(
    guid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<SaleChannelInfoResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let record = state
        .sale_channels
        .info(identity.shop, guid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(SaleChannelInfoResponse {
        success: true,
        data: record.into(),
    }))
}
