//! Get Sale Channel By Code Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{
    extensions::*,
    salechannels::{errors::into_status_error, get::SaleChannelInfoResponse},
    state::State,
};

/// Get Sale Channel By Code Handler
///
/// Returns the live sale channel holding `code`.
#[endpoint(tags("sale-channel"), summary = "Get Sale Channel By Code")]
pub(crate) async fn handler(
    code: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<SaleChannelInfoResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let record = state
        .sale_channels
        .info_by_code(identity.shop, code.into_inner())
        .await
        .map_err(into_status_error)?;

    Ok(Json(SaleChannelInfoResponse {
        success: true,
        data: record.into(),
    }))
}
