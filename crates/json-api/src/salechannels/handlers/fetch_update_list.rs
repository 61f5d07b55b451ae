//! Sale Channel Changes By Offset Handler

use salvo::{oapi::extract::QueryParam, prelude::*};

use crate::{
    params,
    salechannels::fetch_update::{SaleChannelChangesResponse, changes},
};

/// Sale Channel Changes By Offset Handler
///
/// Same feed as the page-based changes endpoint, windowed by `offset`/`limit`
/// and answered with `total`.
#[endpoint(
    tags("sale-channel"),
    summary = "Sale Channel Changes By Offset",
    parameters(
        ("lastUpdate" = String, Query, description = "Watermark, RFC 3339 or YYYY-MM-DDTHH:MM:SS in UTC"),
        ("action" = Option<String>, Query, description = "all, new or remove"),
        ("filter" = Option<String>, Query, description = "key:value pairs separated by commas"),
    ),
)]
pub(crate) async fn handler(
    offset: QueryParam<u64, false>,
    limit: QueryParam<u64, false>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<SaleChannelChangesResponse>, StatusError> {
    let paging = params::step(offset.into_inner(), limit.into_inner());

    changes(req, depot, res, paging).await
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use shopsync::{
        delta::{DeltaFeed, DeltaPage},
        query::{Paging, Step},
    };
    use shopsync_app::{salechannels::SaleChannel, sync::MockRecordsService};

    use crate::test_helpers::{make_record, sale_channels_service};

    use super::*;

    fn make_service(repo: MockRecordsService<SaleChannel>) -> Service {
        sale_channels_service(
            repo,
            Router::with_path("sale-channel/fetch-update/list").get(handler),
        )
    }

    #[tokio::test]
    async fn test_offset_changes_report_total() -> TestResult {
        let mut repo = MockRecordsService::new();

        repo.expect_delta()
            .once()
            .withf(|_, query| query.paging == Paging::Step(Step::new(Some(20), Some(10))))
            .return_once(|_, query| {
                Ok(DeltaPage {
                    feed: DeltaFeed {
                        new: vec![make_record("LINE")],
                        removed: Vec::new(),
                    },
                    page_info: query.paging.describe(21),
                })
            });

        let body: SaleChannelChangesResponse = TestClient::get(
            "http://example.com/sale-channel/fetch-update/list?lastUpdate=2024-05-01T10:15:00Z&offset=20&limit=10",
        )
        .send(&make_service(repo))
        .await
        .take_json()
        .await?;

        assert_eq!(body.total, Some(21));
        assert!(body.pagination.is_none());
        assert_eq!(body.data.new.first().map(|channel| channel.code.as_str()), Some("LINE"));

        Ok(())
    }
}
