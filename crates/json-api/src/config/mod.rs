//! Server configuration module

use std::{net::SocketAddr, time::Duration};

use clap::Parser;

use shopsync_app::{context::AppSettings, settings::StoreArgs};

use crate::config::{
    logging::LoggingConfig, messaging::MessagingConfig, server::ServerRuntimeConfig,
};

pub(crate) mod messaging;
pub(crate) mod logging;
pub(crate) mod server;

pub(crate) use logging::LogFormat;

/// Shopsync JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "shopsync-json", about = "Shopsync JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: StoreArgs,

    /// Event bus and background dispatch settings.
    #[command(flatten)]
    pub messaging: MessagingConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        self.server.socket_addr()
    }

    /// How long shutdown waits for requests, then for background work.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        self.server.shutdown_grace()
    }

    /// Settings used to wire the application services.
    #[must_use]
    pub fn app_settings(&self) -> AppSettings {
        AppSettings::from_args(
            &self.database,
            &self.messaging.bus,
            self.messaging.dispatch_queue_capacity,
        )
    }
}
