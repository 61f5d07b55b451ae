//! Master Sync By Offset Handler

use salvo::{oapi::extract::QueryParam, prelude::*};

use crate::{
    mastersync::{index::aggregate, models::MasterSyncResponse},
    params,
};

/// Master Sync By Offset Handler
///
/// Offset/limit variant of the master-sync aggregate; reports the largest
/// module `total`.
#[endpoint(
    tags("master-sync"),
    summary = "Master Sync By Offset",
    parameters(
        ("lastUpdate" = String, Query, description = "Watermark, RFC 3339 or YYYY-MM-DDTHH:MM:SS in UTC"),
        ("module" = Option<String>, Query, description = "Comma separated module names, or all"),
        ("action" = Option<String>, Query, description = "all, new or remove"),
        ("filter" = Option<String>, Query, description = "key:value pairs separated by commas"),
    ),
)]
pub(crate) async fn handler(
    offset: QueryParam<u64, false>,
    limit: QueryParam<u64, false>,
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<MasterSyncResponse>, StatusError> {
    aggregate(req, depot, params::step(offset.into_inner(), limit.into_inner())).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use shopsync::query::{Paging, Step};
    use shopsync_app::{
        mastersync::MockMasterSyncRepository,
        sync::{MockModuleFeed, ModuleDelta, ModuleRegistry},
    };

    use crate::test_helpers::master_sync_service;

    use super::*;

    #[tokio::test]
    async fn test_offset_master_sync_reports_total() -> TestResult {
        let mut feed = MockModuleFeed::new();

        feed.expect_module().return_const("saleChannel");
        feed.expect_delta_json()
            .once()
            .withf(|_, query| query.paging == Paging::Step(Step::new(Some(5), Some(5))))
            .returning(|_, query| {
                Ok(ModuleDelta {
                    feed: json!({ "new": [], "removed": [] }),
                    page_info: query.paging.describe(9),
                })
            });

        let service = master_sync_service(
            ModuleRegistry::new().with(Arc::new(feed)),
            MockMasterSyncRepository::new(),
            Router::with_path("master-sync/list").get(handler),
        );

        let body: MasterSyncResponse = TestClient::get(
            "http://example.com/master-sync/list?lastUpdate=2024-05-01T10:15:00Z&offset=5&limit=5",
        )
        .send(&service)
        .await
        .take_json()
        .await?;

        assert_eq!(body.total, Some(9));
        assert!(body.pagination.is_none());
        assert_eq!(body.data.get("salechannel"), Some(&json!({ "new": [], "removed": [] })));

        Ok(())
    }
}
