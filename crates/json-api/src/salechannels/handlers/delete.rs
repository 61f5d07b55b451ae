//! Delete Sale Channel Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    envelope::IdResponse, extensions::*, salechannels::errors::into_status_error, state::State,
};

/// Delete Sale Channel Handler
///
/// Soft-deletes a live sale channel.
#[endpoint(tags("sale-channel"), summary = "Delete Sale Channel")]
pub(crate) async fn handler(
    guid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<IdResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;
    let guid = guid.into_inner();

    state
        .sale_channels
        .delete(identity.shop, identity.username.clone(), guid.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(IdResponse::new(guid)))
}
