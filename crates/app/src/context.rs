//! App Context

use std::{sync::Arc, time::Duration};

use thiserror::Error;

use shopsync::{records::Entity, topics::TopicScheme};

use crate::{
    database::{self, Db, RlsRoleError},
    dispatch::Dispatcher,
    events::{BusError, EventPublisher, NatsMessageBus},
    mastersync::{MasterSyncNotifier, MasterSyncRepository, PgMasterSyncRepository},
    salechannels::SaleChannel,
    settings::{BusArgs, StoreArgs},
    store::PgDocumentStore,
    sync::{ModuleRegistry, PgRecordsService, RecordsService},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error(transparent)]
    Role(#[from] RlsRoleError),

    #[error("failed to set up message bus")]
    Bus(#[source] BusError),
}

/// Everything needed to wire the services.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub database_url: String,
    pub nats_url: String,
    pub topic_prefix: String,
    pub store_timeout: Duration,
    pub dispatch_capacity: usize,
}

impl AppSettings {
    #[must_use]
    pub fn from_args(store: &StoreArgs, bus: &BusArgs, dispatch_capacity: usize) -> Self {
        Self {
            database_url: store.database_url.clone(),
            nats_url: bus.nats_url.clone(),
            topic_prefix: bus.subject_prefix.clone(),
            store_timeout: store.store_timeout(),
            dispatch_capacity,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub sale_channels: Arc<dyn RecordsService<SaleChannel>>,
    pub modules: ModuleRegistry,
    pub master_sync: Arc<dyn MasterSyncRepository>,
    pub dispatcher: Dispatcher,
    pub topics: TopicScheme,
}

impl AppContext {
    /// Connect to the database and the broker, then build every service.
    ///
    /// # Errors
    ///
    /// Returns an error when the database or broker is unreachable, the connected
    /// role bypasses row-level security, or a module stream cannot be created.
    pub async fn connect(settings: &AppSettings) -> Result<Self, AppInitError> {
        let pool = database::connect(&settings.database_url)
            .await
            .map_err(AppInitError::Database)?;

        database::ensure_rls_enforced_role(&pool).await?;

        let db = Db::new(pool).with_timeout(settings.store_timeout);
        let topics = TopicScheme::new(settings.topic_prefix.clone());

        let bus = NatsMessageBus::connect(&settings.nats_url)
            .await
            .map_err(AppInitError::Bus)?;

        bus.ensure_streams(&topics, &[SaleChannel::MODULE])
            .await
            .map_err(AppInitError::Bus)?;

        let (dispatcher, _worker) = Dispatcher::spawn(settings.dispatch_capacity);

        let master_sync: Arc<dyn MasterSyncRepository> =
            Arc::new(PgMasterSyncRepository::new(db.clone()));

        let publisher = EventPublisher::new(Arc::new(bus), topics.clone(), dispatcher.clone());
        let notifier = MasterSyncNotifier::new(master_sync.clone(), dispatcher.clone());

        let sale_channels = Arc::new(PgRecordsService::<SaleChannel>::new(
            PgDocumentStore::new(db),
            publisher,
            notifier,
        ));

        let modules = ModuleRegistry::new().with(sale_channels.clone());

        Ok(Self {
            sale_channels,
            modules,
            master_sync,
            dispatcher,
            topics,
        })
    }
}
