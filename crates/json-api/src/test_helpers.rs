//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use shopsync::{
    records::{Audit, Record},
    uuids::{GuidFixed, ShopUuid},
};
use shopsync_app::{
    dispatch::Dispatcher,
    mastersync::MockMasterSyncRepository,
    salechannels::SaleChannel,
    sync::{MockRecordsService, ModuleRegistry},
};

use crate::{
    extensions::*,
    identity::{Identity, SHOP_HEADER, USERNAME_HEADER},
    state::State,
};

pub(crate) const TEST_SHOP: ShopUuid = ShopUuid::from_uuid(Uuid::nil());
pub(crate) const TEST_USER: &str = "tester";

#[salvo::handler]
pub(crate) async fn inject_identity(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_identity(Identity {
        shop: TEST_SHOP,
        username: TEST_USER.to_string(),
    });
    ctrl.call_next(req, depot, res).await;
}

/// Headers the gateway would forward for the test identity.
pub(crate) fn identity_headers() -> [(&'static str, String); 2] {
    [
        (SHOP_HEADER, TEST_SHOP.to_string()),
        (USERNAME_HEADER, TEST_USER.to_string()),
    ]
}

fn strict_sale_channels_mock() -> MockRecordsService<SaleChannel> {
    let mut sale_channels = MockRecordsService::new();

    sale_channels.expect_create().never();
    sale_channels.expect_update().never();
    sale_channels.expect_delete().never();
    sale_channels.expect_delete_many().never();
    sale_channels.expect_info().never();
    sale_channels.expect_info_by_code().never();
    sale_channels.expect_search().never();
    sale_channels.expect_import().never();
    sale_channels.expect_delta().never();

    sale_channels
}

fn strict_master_sync_mock() -> MockMasterSyncRepository {
    let mut master_sync = MockMasterSyncRepository::new();

    master_sync.expect_touch().never();
    master_sync.expect_markers().never();

    master_sync
}

pub(crate) fn state(
    sale_channels: MockRecordsService<SaleChannel>,
    modules: ModuleRegistry,
    master_sync: MockMasterSyncRepository,
) -> Arc<State> {
    let (dispatcher, _worker) = Dispatcher::new(16);

    Arc::new(State {
        sale_channels: Arc::new(sale_channels),
        modules,
        master_sync: Arc::new(master_sync),
        dispatcher,
    })
}

pub(crate) fn sale_channels_service(
    sale_channels: MockRecordsService<SaleChannel>,
    route: Router,
) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state(
                sale_channels,
                ModuleRegistry::new(),
                strict_master_sync_mock(),
            )))
            .hoop(inject_identity)
            .push(route),
    )
}

pub(crate) fn master_sync_service(
    modules: ModuleRegistry,
    master_sync: MockMasterSyncRepository,
    route: Router,
) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state(strict_sale_channels_mock(), modules, master_sync)))
            .hoop(inject_identity)
            .push(route),
    )
}

pub(crate) fn make_channel(code: &str) -> SaleChannel {
    SaleChannel {
        code: code.to_string(),
        name: format!("Channel {code}"),
        gp: 12.5,
        gp_type: 1,
        image_uri: None,
    }
}

pub(crate) fn make_record(code: &str) -> Record<SaleChannel> {
    Record {
        shop: TEST_SHOP,
        guid: GuidFixed::new(),
        data: make_channel(code),
        audit: Audit::created(Timestamp::UNIX_EPOCH, TEST_USER),
    }
}
