//! NATS `JetStream` message bus.

use std::time::Duration;

use async_nats::jetstream::{self, stream};
use async_trait::async_trait;
use tracing::info;

use shopsync::topics::TopicScheme;

use crate::events::{BusError, MessageBus};

/// How long the broker keeps events for consumers that fell behind.
pub const EVENT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Stream holding every subject of `module`.
#[must_use]
pub fn stream_config(topics: &TopicScheme, module: &str) -> stream::Config {
    stream::Config {
        name: topics.stream_name(module),
        subjects: vec![topics.module_filter(module)],
        max_age: EVENT_RETENTION,
        ..Default::default()
    }
}

#[derive(Clone)]
pub struct NatsMessageBus {
    jetstream: jetstream::Context,
}

impl std::fmt::Debug for NatsMessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsMessageBus").finish_non_exhaustive()
    }
}

impl NatsMessageBus {
    /// Connect to the broker at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Connect`] when the broker cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|error| BusError::Connect(Box::new(error)))?;

        Ok(Self {
            jetstream: jetstream::new(client),
        })
    }

    #[must_use]
    pub fn jetstream(&self) -> &jetstream::Context {
        &self.jetstream
    }

    /// Create the stream of every module that does not have one yet.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Stream`] when a stream cannot be created.
    pub async fn ensure_streams(
        &self,
        topics: &TopicScheme,
        modules: &[&str],
    ) -> Result<(), BusError> {
        for module in modules {
            let config = stream_config(topics, module);
            let name = config.name.clone();

            self.jetstream
                .get_or_create_stream(config)
                .await
                .map_err(|error| BusError::Stream {
                    stream: name.clone(),
                    source: Box::new(error),
                })?;

            info!(stream = %name, "event stream ready");
        }

        Ok(())
    }
}

#[async_trait]
impl MessageBus for NatsMessageBus {
    async fn publish(&self, topic: String, payload: Vec<u8>) -> Result<(), BusError> {
        let ack = self
            .jetstream
            .publish(topic.clone(), payload.into())
            .await
            .map_err(|error| BusError::Publish {
                topic: topic.clone(),
                source: Box::new(error),
            })?;

        ack.await.map_err(|error| BusError::Publish {
            topic,
            source: Box::new(error),
        })?;

        Ok(())
    }
}
