//! Connection settings shared by every binary.
//!
//! The API server and the projector read the same variables, so both flatten
//! these argument groups instead of declaring their own.

use std::time::Duration;

use clap::Args;

use shopsync::topics::TopicScheme;

/// Application database settings.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Upper bound on a single store operation, in seconds
    #[arg(long, env = "STORE_TIMEOUT_SECONDS", default_value_t = 15)]
    pub store_timeout_seconds: u64,
}

impl StoreArgs {
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_seconds)
    }
}

/// Event bus settings.
#[derive(Debug, Clone, Args)]
pub struct BusArgs {
    /// NATS server URL
    #[arg(long, env = "NATS_URL", default_value = "nats://127.0.0.1:4222")]
    pub nats_url: String,

    /// Subject prefix events are published under
    #[arg(long, env = "NATS_SUBJECT_PREFIX", default_value = "shopsync")]
    pub subject_prefix: String,
}

impl BusArgs {
    #[must_use]
    pub fn topics(&self) -> TopicScheme {
        TopicScheme::new(self.subject_prefix.clone())
    }
}
