//! Master-sync notifier.

use std::sync::Arc;

use jiff::Timestamp;

use shopsync::uuids::ShopUuid;

use crate::{dispatch::Dispatcher, mastersync::MasterSyncRepository};

/// Touches master-sync markers in the background after a successful mutation.
#[derive(Clone)]
pub struct MasterSyncNotifier {
    repository: Arc<dyn MasterSyncRepository>,
    dispatcher: Dispatcher,
}

impl std::fmt::Debug for MasterSyncNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSyncNotifier").finish_non_exhaustive()
    }
}

impl MasterSyncNotifier {
    #[must_use]
    pub fn new(repository: Arc<dyn MasterSyncRepository>, dispatcher: Dispatcher) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Record that `module` changed for `shop` now. Failures are logged, never returned.
    pub fn save(&self, shop: ShopUuid, module: &'static str) {
        let repository = Arc::clone(&self.repository);
        let at = Timestamp::now();

        self.dispatcher
            .dispatch(format!("master-sync {module}"), async move {
                repository
                    .touch(shop, module.to_string(), at)
                    .await
                    .map_err(Into::into)
            });
    }
}
