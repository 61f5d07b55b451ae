//! Search Sale Channels Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use shopsync::query::{Listing, Paging};
use shopsync::records::Record;
use shopsync_app::salechannels::SaleChannel;

use crate::{
    envelope::{PaginationResponse, paging_fields},
    extensions::*,
    params,
    salechannels::{errors::into_status_error, models::SaleChannelResponse},
    state::State,
};

/// Live sale channels matching a search, with `pagination` for page requests
/// and `total` for offset requests.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SaleChannelListResponse {
    pub success: bool,
    pub data: Vec<SaleChannelResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl From<Listing<Record<SaleChannel>>> for SaleChannelListResponse {
    fn from(listing: Listing<Record<SaleChannel>>) -> Self {
        let (pagination, total) = paging_fields(listing.page_info);

        Self {
            success: true,
            data: listing.items.into_iter().map(Into::into).collect(),
            pagination,
            total,
        }
    }
}

pub(crate) async fn search(
    depot: &mut Depot,
    q: Option<String>,
    filter: Option<String>,
    paging: Paging,
) -> Result<Json<SaleChannelListResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let listing = state
        .sale_channels
        .search(identity.shop, params::search(q, filter), paging)
        .await
        .map_err(into_status_error)?;

    Ok(Json(listing.into()))
}

/// Search Sale Channels Handler
///
/// Case-insensitive match of `q` against code and name, plus exact `filter`
/// pairs, one page at a time.
#[endpoint(tags("sale-channel"), summary = "Search Sale Channels")]
pub(crate) async fn handler(
    q: QueryParam<String, false>,
    filter: QueryParam<String, false>,
    page: QueryParam<u64, false>,
    limit: QueryParam<u64, false>,
    depot: &mut Depot,
) -> Result<Json<SaleChannelListResponse>, StatusError> {
    search(
        depot,
        q.into_inner(),
        filter.into_inner(),
        params::page(page.into_inner(), limit.into_inner()),
    )
    .await
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use shopsync::query::{Page, PageInfo};
    use shopsync_app::sync::MockRecordsService;

    use crate::test_helpers::{TEST_SHOP, make_record, sale_channels_service};

    use super::*;

    fn make_service(repo: MockRecordsService<SaleChannel>) -> Service {
        sale_channels_service(repo, Router::with_path("sale-channel").get(handler))
    }

    #[tokio::test]
    async fn test_search_passes_query_filters_and_page() -> TestResult {
        let mut repo = MockRecordsService::new();

        repo.expect_search()
            .once()
            .withf(|shop, query, paging| {
                *shop == TEST_SHOP
                    && query.q.as_deref() == Some("grab")
                    && query.filters.get("gpType").and_then(|v| v.as_str()) == Some("1")
                    && *paging == Paging::Page(Page::new(Some(2), Some(5)))
            })
            .return_once(|_, _, paging| {
                Ok(Listing {
                    items: vec![make_record("GRAB")],
                    page_info: paging.describe(6),
                })
            });

        let body: SaleChannelListResponse = TestClient::get(
            "http://example.com/sale-channel?q=grab&filter=gpType:1&page=2&limit=5",
        )
        .send(&make_service(repo))
        .await
        .take_json()
        .await?;

        assert!(body.success);
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data.first().map(|channel| channel.code.as_str()), Some("GRAB"));
        assert_eq!(body.total, None);

        let pagination = body.pagination.ok_or("missing pagination")?;

        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.total_page, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_search_without_params_uses_first_page() -> TestResult {
        let mut repo = MockRecordsService::new();

        repo.expect_search()
            .once()
            .withf(|_, query, paging| {
                query.q.is_none()
                    && query.filters.is_empty()
                    && *paging == Paging::Page(Page::default())
            })
            .return_once(|_, _, _| {
                Ok(Listing {
                    items: Vec::new(),
                    page_info: PageInfo::Page(Page::default().paginate(0)),
                })
            });

        let body: SaleChannelListResponse = TestClient::get("http://example.com/sale-channel")
            .send(&make_service(repo))
            .await
            .take_json()
            .await?;

        assert!(body.data.is_empty());
        assert_eq!(body.pagination.map(|p| p.total), Some(0));

        Ok(())
    }
}
