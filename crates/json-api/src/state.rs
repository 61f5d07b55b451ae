//! State

use std::sync::Arc;

use shopsync_app::{
    context::AppContext, dispatch::Dispatcher, mastersync::MasterSyncRepository,
    salechannels::SaleChannel, sync::{ModuleRegistry, RecordsService},
};

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) sale_channels: Arc<dyn RecordsService<SaleChannel>>,
    pub(crate) modules: ModuleRegistry,
    pub(crate) master_sync: Arc<dyn MasterSyncRepository>,
    pub(crate) dispatcher: Dispatcher,
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("modules", &self.modules)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl State {
    #[must_use]
    pub(crate) fn from_app_context(app: AppContext) -> Arc<Self> {
        Arc::new(Self {
            sale_channels: app.sale_channels,
            modules: app.modules,
            master_sync: app.master_sync,
            dispatcher: app.dispatcher,
        })
    }
}
