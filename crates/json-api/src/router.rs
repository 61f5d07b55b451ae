//! App Router

use salvo::Router;

use crate::{identity, mastersync, salechannels};

/// Every route acting for a shop, behind the identity middleware.
pub(crate) fn app_router() -> Router {
    Router::new()
        .hoop(identity::handler)
        .push(
            Router::with_path("sale-channel")
                .get(salechannels::index::handler)
                .post(salechannels::create::handler)
                .delete(salechannels::delete_many::handler)
                .push(Router::with_path("list").get(salechannels::list::handler))
                .push(Router::with_path("bulk").post(salechannels::bulk::handler))
                .push(
                    Router::with_path("fetch-update")
                        .get(salechannels::fetch_update::handler)
                        .push(Router::with_path("list").get(salechannels::fetch_update_list::handler)),
                )
                .push(Router::with_path("code/{code}").get(salechannels::get_by_code::handler))
                .push(
                    Router::with_path("{guid}")
                        .get(salechannels::get::handler)
                        .put(salechannels::update::handler)
                        .delete(salechannels::delete::handler),
                ),
        )
        .push(
            Router::with_path("master-sync")
                .get(mastersync::index::handler)
                .push(Router::with_path("list").get(mastersync::list::handler))
                .push(Router::with_path("status").get(mastersync::status::handler)),
        )
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use shopsync::query::Listing;
    use shopsync_app::{
        mastersync::{MockMasterSyncRepository, SyncMarker},
        sync::{MockRecordsService, ModuleRegistry},
    };

    use crate::{
        identity::SHOP_HEADER,
        test_helpers::{TEST_SHOP, identity_headers, make_record, state},
    };

    use super::*;

    fn service(
        sale_channels: MockRecordsService<shopsync_app::salechannels::SaleChannel>,
        master_sync: MockMasterSyncRepository,
    ) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(state(
                    sale_channels,
                    ModuleRegistry::new(),
                    master_sync,
                )))
                .push(app_router()),
        )
    }

    #[tokio::test]
    async fn test_static_segments_win_over_guid_routes() -> TestResult {
        let mut sale_channels = MockRecordsService::new();

        sale_channels
            .expect_search()
            .once()
            .return_once(|_, _, paging| {
                Ok(Listing {
                    items: vec![make_record("GRAB")],
                    page_info: paging.describe(1),
                })
            });
        sale_channels.expect_info().never();

        let mut master_sync = MockMasterSyncRepository::new();

        master_sync
            .expect_markers()
            .once()
            .withf(|shop| *shop == TEST_SHOP)
            .return_once(|_| {
                Ok(vec![SyncMarker {
                    module: "saleChannel".to_string(),
                    changed_at: jiff::Timestamp::UNIX_EPOCH,
                }])
            });

        let service = service(sale_channels, master_sync);

        let mut list = TestClient::get("http://example.com/sale-channel/list");
        let mut status = TestClient::get("http://example.com/master-sync/status");

        for (name, value) in identity_headers() {
            list = list.add_header(name, value.clone(), true);
            status = status.add_header(name, value, true);
        }

        let body: serde_json::Value = list.send(&service).await.take_json().await?;

        assert_eq!(body.get("total"), Some(&serde_json::json!(1)));

        let res = status.send(&service).await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_routes_require_identity_headers() -> TestResult {
        let service = service(MockRecordsService::new(), MockMasterSyncRepository::new());

        for uri in [
            "http://example.com/sale-channel",
            "http://example.com/master-sync/status",
        ] {
            let res = TestClient::get(uri)
                .add_header(SHOP_HEADER, TEST_SHOP.to_string(), true)
                .send(&service)
                .await;

            assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED), "{uri}");
        }

        Ok(())
    }
}
