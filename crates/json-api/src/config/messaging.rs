//! Messaging Config

use clap::Args;

use shopsync_app::settings::BusArgs;

/// Event bus and background dispatch settings.
#[derive(Debug, Args)]
pub struct MessagingConfig {
    /// Broker connection and subject prefix, shared with the projector.
    #[command(flatten)]
    pub bus: BusArgs,

    /// Capacity of the background publish/notify queue
    #[arg(long, env = "DISPATCH_QUEUE_CAPACITY", default_value_t = 1024)]
    pub dispatch_queue_capacity: usize,
}
