//! Update Sale Channel Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};
use uuid::Uuid;

use crate::{
    envelope::IdResponse,
    extensions::*,
    salechannels::{errors::into_status_error, models::SaleChannelRequest},
    state::State,
};

/// Update Sale Channel Handler
///
/// Replaces the payload of a live sale channel.
#[endpoint(
    tags("sale-channel"),
    summary = "Update Sale Channel",
    responses(
        (status_code = StatusCode::CREATED, description = "Sale channel updated"),
        (status_code = StatusCode::NOT_FOUND, description = "No live sale channel"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    guid: PathParam<Uuid>,
    json: JsonBody<SaleChannelRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<IdResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let record = state
        .sale_channels
        .update(
            identity.shop,
            identity.username.clone(),
            guid.into_inner().into(),
            json.into_inner().into(),
        )
        .await
        .map_err(into_status_error)?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(IdResponse::new(record.guid.into_uuid())))
}
