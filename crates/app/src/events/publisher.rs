//! Event publisher.

use std::sync::Arc;

use tracing::error;

use shopsync::{
    records::{Entity, Record},
    topics::{Operation, TopicScheme},
};

use crate::{dispatch::Dispatcher, events::MessageBus};

/// Publishes record snapshots in the background.
///
/// Publishing never fails the caller: encoding errors are logged here and
/// broker errors are logged by the dispatcher.
#[derive(Clone)]
pub struct EventPublisher {
    bus: Arc<dyn MessageBus>,
    topics: TopicScheme,
    dispatcher: Dispatcher,
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("topics", &self.topics)
            .finish_non_exhaustive()
    }
}

impl EventPublisher {
    #[must_use]
    pub fn new(bus: Arc<dyn MessageBus>, topics: TopicScheme, dispatcher: Dispatcher) -> Self {
        Self {
            bus,
            topics,
            dispatcher,
        }
    }

    #[must_use]
    pub fn topics(&self) -> &TopicScheme {
        &self.topics
    }

    /// Publish one snapshot.
    pub fn publish<T: Entity>(&self, operation: Operation, snapshot: &Record<T>) {
        self.send(T::MODULE, operation, serde_json::to_vec(snapshot));
    }

    /// Publish a batch as a single message holding a JSON array. Empty batches are not sent.
    pub fn publish_bulk<T: Entity>(&self, operation: Operation, snapshots: &[Record<T>]) {
        if snapshots.is_empty() {
            return;
        }

        self.send(T::MODULE, operation, serde_json::to_vec(snapshots));
    }

    fn send(
        &self,
        module: &str,
        operation: Operation,
        payload: Result<Vec<u8>, serde_json::Error>,
    ) {
        let topic = self.topics.topic(module, operation);

        let payload = match payload {
            Ok(payload) => payload,
            Err(error) => {
                error!(topic = %topic, "failed to encode event: {error}");
                return;
            }
        };

        let bus = Arc::clone(&self.bus);

        self.dispatcher
            .dispatch(format!("publish {topic}"), async move {
                bus.publish(topic, payload).await.map_err(Into::into)
            });
    }
}
