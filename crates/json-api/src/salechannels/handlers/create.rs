//! Create Sale Channel Handler

use std::sync::Arc;

use salvo::{http::header::LOCATION, oapi::extract::JsonBody, prelude::*};

use crate::{
    envelope::IdResponse,
    extensions::*,
    salechannels::{errors::into_status_error, models::SaleChannelRequest},
    state::State,
};

/// Create Sale Channel Handler
#[endpoint(
    tags("sale-channel"),
    summary = "Create Sale Channel",
    responses(
        (status_code = StatusCode::CREATED, description = "Sale channel created"),
        (status_code = StatusCode::CONFLICT, description = "Code already in use"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<SaleChannelRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<IdResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let record = state
        .sale_channels
        .create(
            identity.shop,
            identity.username.clone(),
            json.into_inner().into(),
        )
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/sale-channel/{}", record.guid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(IdResponse::new(record.guid.into_uuid())))
}
