//! Caller identity forwarded by the gateway.

use salvo::prelude::*;

use shopsync::uuids::ShopUuid;

use crate::extensions::*;

pub(crate) const SHOP_HEADER: &str = "x-shop-id";
pub(crate) const USERNAME_HEADER: &str = "x-username";

/// Shop and user a request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    pub(crate) shop: ShopUuid,
    pub(crate) username: String,
}

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(shop) = req
        .header::<String>(SHOP_HEADER)
        .and_then(|value| value.trim().parse::<ShopUuid>().ok())
    else {
        res.render(StatusError::unauthorized().brief("Missing or invalid X-Shop-Id header"));

        return;
    };

    let Some(username) = req
        .header::<String>(USERNAME_HEADER)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    else {
        res.render(StatusError::unauthorized().brief("Missing X-Username header"));

        return;
    };

    depot.insert_identity(Identity { shop, username });

    ctrl.call_next(req, depot, res).await;
}
