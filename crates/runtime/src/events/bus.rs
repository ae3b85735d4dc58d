//! Topic-based event bus.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{CombatEvent, CombatTagUpdate, ReplicationEvent};

/// Topics for event routing.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Verdicts and collaborator notifications.
    Combat,
    /// Entity fact sync for predicting peers.
    Replication,
    /// Combat-tag countdowns for the UI.
    Tag,
}

/// Event wrapper that carries the topic and typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Combat(CombatEvent),
    Replication(ReplicationEvent),
    Tag(CombatTagUpdate),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Combat(_) => Topic::Combat,
            Event::Replication(_) => Topic::Replication,
            Event::Tag(_) => Topic::Tag,
        }
    }
}

/// Topic-based event bus.
///
/// Consumers subscribe to the topics they care about; publication is
/// best-effort and a topic without subscribers is not an error.
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(128)
    }

    /// Creates a bus with the given per-topic channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut channels = HashMap::new();
        for topic in [Topic::Combat, Topic::Replication, Topic::Tag] {
            channels.insert(topic, broadcast::channel(capacity).0);
        }
        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publishes an event to its topic.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        let tx = self
            .channels
            .get(&topic)
            .expect("all topics are pre-created");
        if tx.send(event).is_err() {
            // No subscribers on this topic right now.
            tracing::trace!(?topic, "event dropped without subscribers");
        }
    }

    /// Subscribes to a single topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels
            .get(&topic)
            .expect("all topics are pre-created")
            .subscribe()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
