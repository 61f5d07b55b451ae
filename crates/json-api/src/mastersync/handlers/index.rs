//! Master Sync Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};

use shopsync::query::Paging;
use shopsync_app::sync::ModuleSelection;

use crate::{
    extensions::*,
    mastersync::{errors::feed_error, models::MasterSyncResponse},
    params,
    salechannels::fetch_update::last_update,
    state::State,
};

pub(crate) async fn aggregate(
    req: &Request,
    depot: &mut Depot,
    paging: Paging,
) -> Result<Json<MasterSyncResponse>, StatusError> {
    let query = params::delta(
        last_update(req),
        req.query::<String>("action"),
        req.query::<String>("filter"),
        paging,
    )?;

    let selection = ModuleSelection::parse(&req.query::<String>("module").unwrap_or_default());

    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let feed = state
        .modules
        .delta(identity.shop, &selection, &query)
        .await
        .map_err(feed_error)?;

    Ok(Json(feed.into()))
}

/// Master Sync Handler
///
/// Changes since `lastUpdate` across every module named in `module`
/// (comma separated, default all), each module paged with the same window.
#[endpoint(
    tags("master-sync"),
    summary = "Master Sync",
    parameters(
        ("lastUpdate" = String, Query, description = "Watermark, RFC 3339 or YYYY-MM-DDTHH:MM:SS in UTC"),
        ("module" = Option<String>, Query, description = "Comma separated module names, or all"),
        ("action" = Option<String>, Query, description = "all, new or remove"),
        ("filter" = Option<String>, Query, description = "key:value pairs separated by commas"),
    ),
)]
pub(crate) async fn handler(
    page: QueryParam<u64, false>,
    limit: QueryParam<u64, false>,
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<MasterSyncResponse>, StatusError> {
    aggregate(req, depot, params::page(page.into_inner(), limit.into_inner())).await
}
