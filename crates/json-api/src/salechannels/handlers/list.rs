//! Search Sale Channels By Offset Handler

use salvo::{oapi::extract::QueryParam, prelude::*};

use crate::{
    params,
    salechannels::index::{SaleChannelListResponse, search},
};

/// Search Sale Channels By Offset Handler
///
/// Same matching as the page-based search; answers with `total` instead of
/// `pagination`.
#[endpoint(tags("sale-channel"), summary = "Search Sale Channels By Offset")]
pub(crate) async fn handler(
    q: QueryParam<String, false>,
    filter: QueryParam<String, false>,
    offset: QueryParam<u64, false>,
    limit: QueryParam<u64, false>,
    depot: &mut Depot,
) -> Result<Json<SaleChannelListResponse>, StatusError> {
    search(
        depot,
        q.into_inner(),
        filter.into_inner(),
        params::step(offset.into_inner(), limit.into_inner()),
    )
    .await
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use shopsync::query::{Listing, Paging, Step};
    use shopsync_app::{salechannels::SaleChannel, sync::MockRecordsService};

    use crate::test_helpers::{make_record, sale_channels_service};

    use super::*;

    fn make_service(repo: MockRecordsService<SaleChannel>) -> Service {
        sale_channels_service(repo, Router::with_path("sale-channel/list").get(handler))
    }

    #[tokio::test]
    async fn test_list_reports_total_instead_of_pagination() -> TestResult {
        let mut repo = MockRecordsService::new();

        repo.expect_search()
            .once()
            .withf(|_, _, paging| *paging == Paging::Step(Step::new(Some(10), Some(2))))
            .return_once(|_, _, paging| {
                Ok(Listing {
                    items: vec![make_record("A"), make_record("B")],
                    page_info: paging.describe(14),
                })
            });

        let body: SaleChannelListResponse =
            TestClient::get("http://example.com/sale-channel/list?offset=10&limit=2")
                .send(&make_service(repo))
                .await
                .take_json()
                .await?;

        assert_eq!(body.data.len(), 2);
        assert_eq!(body.total, Some(14));
        assert!(body.pagination.is_none());

        Ok(())
    }
}
