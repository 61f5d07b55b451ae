//! Master Sync Status Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    extensions::*,
    mastersync::{errors::marker_error, models::SyncStatusResponse},
    state::State,
};

/// Master Sync Status Handler
///
/// Last change time of every module the shop has touched. Clients compare
/// these against their own watermarks before pulling deltas.
#[endpoint(tags("master-sync"), summary = "Master Sync Status")]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<SyncStatusResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let markers = state
        .master_sync
        .markers(identity.shop)
        .await
        .map_err(marker_error)?;

    Ok(Json(SyncStatusResponse {
        success: true,
        data: markers.into_iter().map(Into::into).collect(),
    }))
}
