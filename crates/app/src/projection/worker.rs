//! Projection consumer loop.

use std::sync::Arc;

use async_nats::jetstream::{
    self,
    consumer::{AckPolicy, PullConsumer, pull},
};
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use shopsync::{projection::ProjectionRow, records::Entity, topics::TopicScheme};

use crate::{
    events::{BusError, nats::stream_config},
    projection::{ProjectionHandler, ProjectionStore},
};

/// Durable consumer name for `(group, module)`.
#[must_use]
pub fn consumer_name(group: &str, module: &str) -> String {
    format!("{group}-{module}")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Durable pull consumer feeding one module's events to a [`ProjectionHandler`].
///
/// Every message is acknowledged once handled, whether or not applying it
/// succeeded, so a poison message never blocks the stream.
pub struct ProjectionWorker<R, S> {
    handler: Arc<ProjectionHandler<R, S>>,
    jetstream: jetstream::Context,
    topics: TopicScheme,
    group: String,
}

impl<R, S> ProjectionWorker<R, S>
where
    R: ProjectionRow,
    S: ProjectionStore<R>,
{
    #[must_use]
    pub fn new(
        handler: Arc<ProjectionHandler<R, S>>,
        jetstream: jetstream::Context,
        topics: TopicScheme,
        group: impl Into<String>,
    ) -> Self {
        Self {
            handler,
            jetstream,
            topics,
            group: group.into(),
        }
    }

    /// Consume until the message stream ends.
    ///
    /// # Errors
    ///
    /// Returns an error when the stream or consumer cannot be set up.
    pub async fn run(self) -> Result<(), BusError> {
        let module = R::Source::MODULE;
        let config = stream_config(&self.topics, module);
        let subject = self.topics.module_filter(module);
        let name = consumer_name(&self.group, module);

        let stream = self
            .jetstream
            .get_or_create_stream(config)
            .await
            .map_err(|error| BusError::Stream {
                stream: self.topics.stream_name(module),
                source: Box::new(error),
            })?;

        let consumer: PullConsumer = stream
            .get_or_create_consumer(
                &name,
                pull::Config {
                    durable_name: Some(name.clone()),
                    filter_subject: subject.clone(),
                    ack_policy: AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await
            .map_err(|error| BusError::Consume {
                subject: subject.clone(),
                source: Box::new(error),
            })?;

        let mut messages = consumer
            .messages()
            .await
            .map_err(|error| BusError::Consume {
                subject: subject.clone(),
                source: Box::new(error),
            })?;

        info!(consumer = %name, subject = %subject, "projection consumer started");

        while let Some(message) = messages.next().await {
            let message = match message {
                Ok(message) => message,
                Err(error) => {
                    warn!(consumer = %name, "failed to receive message: {error}");
                    continue;
                }
            };

            match self.handler.handle(&message.subject, &message.payload).await {
                Ok(outcomes) => {
                    debug!(consumer = %name, subject = %message.subject, ?outcomes, "message applied");
                }
                Err(error) => {
                    error!(consumer = %name, subject = %message.subject, "skipping message: {error}");
                }
            }

            if let Err(error) = message.ack().await {
                warn!(consumer = %name, "failed to ack message: {error}");
            }
        }

        info!(consumer = %name, "projection consumer stopped");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_names_are_per_group_and_module() {
        assert_eq!(consumer_name("reporting", "saleChannel"), "reporting-saleChannel");
        assert_eq!(consumer_name("pos.sync v2", "member"), "pos_sync_v2-member");
    }
}
