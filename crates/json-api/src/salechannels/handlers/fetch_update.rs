//! Sale Channel Changes Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use shopsync::{delta::DeltaPage, query::Paging};
use shopsync_app::salechannels::SaleChannel;

use crate::{
    envelope::{PaginationResponse, paging_fields},
    extensions::*,
    params,
    salechannels::{
        errors::into_status_error,
        models::{RemovedSaleChannelResponse, SaleChannelResponse},
    },
    state::State,
};

/// Header carrying the largest change time in the response.
pub(crate) const WATERMARK_HEADER: &str = "x-sync-watermark";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SaleChannelChanges {
    /// Created or updated since the watermark
    pub new: Vec<SaleChannelResponse>,

    /// Deleted since the watermark
    pub removed: Vec<RemovedSaleChannelResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SaleChannelChangesResponse {
    pub success: bool,
    pub data: SaleChannelChanges,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl From<DeltaPage<SaleChannel>> for SaleChannelChangesResponse {
    fn from(page: DeltaPage<SaleChannel>) -> Self {
        let (pagination, total) = paging_fields(page.page_info);

        Self {
            success: true,
            data: SaleChannelChanges {
                new: page.feed.new.into_iter().map(Into::into).collect(),
                removed: page.feed.removed.into_iter().map(Into::into).collect(),
            },
            pagination,
            total,
        }
    }
}

/// `lastUpdate`, also accepted as `lastupdate`.
pub(crate) fn last_update(req: &Request) -> Option<String> {
    req.query::<String>("lastUpdate")
        .or_else(|| req.query::<String>("lastupdate"))
}

pub(crate) async fn changes(
    req: &Request,
    depot: &mut Depot,
    res: &mut Response,
    paging: Paging,
) -> Result<Json<SaleChannelChangesResponse>, StatusError> {
    let query = params::delta(
        last_update(req),
        req.query::<String>("action"),
        req.query::<String>("filter"),
        paging,
    )?;

    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let page = state
        .sale_channels
        .delta(identity.shop, query)
        .await
        .map_err(into_status_error)?;

    if let Some(watermark) = page.feed.watermark() {
        res.add_header(WATERMARK_HEADER, watermark.to_string(), true)
            .or_500("failed to set watermark header")?;
    }

    Ok(Json(page.into()))
}

/// Sale Channel Changes Handler
///
/// Sale channels created, updated or deleted after `lastUpdate`. `action`
/// narrows the answer to `new` or `remove`.
#[endpoint(
    tags("sale-channel"),
    summary = "Sale Channel Changes",
    parameters(
        ("lastUpdate" = String, Query, description = "Watermark, RFC 3339 or YYYY-MM-DDTHH:MM:SS in UTC"),
        ("action" = Option<String>, Query, description = "all, new or remove"),
        ("filter" = Option<String>, Query, description = "key:value pairs separated by commas"),
    ),
    responses(
        (status_code = StatusCode::OK, description = "Changes since the watermark"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid watermark or action"),
    ),
)]
pub(crate) async fn handler(
    page: QueryParam<u64, false>,
    limit: QueryParam<u64, false>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<SaleChannelChangesResponse>, StatusError> {
    let paging = params::page(page.into_inner(), limit.into_inner());

    changes(req, depot, res, paging).await
}
