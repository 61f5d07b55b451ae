//! Message bus seam.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::dispatch::BoxError;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("failed to connect to the message bus")]
    Connect(#[source] BoxError),

    #[error("failed to prepare stream `{stream}`")]
    Stream {
        stream: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to publish to `{topic}`")]
    Publish {
        topic: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to consume `{subject}`")]
    Consume {
        subject: String,
        #[source]
        source: BoxError,
    },
}

#[automock]
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish `payload` on `topic` and wait for the broker to accept it.
    async fn publish(&self, topic: String, payload: Vec<u8>) -> Result<(), BusError>;
}
