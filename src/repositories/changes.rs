use std::{collections::HashMap, sync::Arc};

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Emitted after a document in a collection has been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: String,
    pub document_id: Uuid,
}

/// In-process fan-out of write notifications, one broadcast channel per collection.
#[derive(Clone)]
pub struct CollectionChanges {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<ChangeEvent>>>>,
    buffer: usize,
}

impl std::fmt::Debug for CollectionChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionChanges")
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

impl CollectionChanges {
    pub fn new(buffer: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    pub async fn subscribe(&self, collection: &str) -> broadcast::Receiver<ChangeEvent> {
        let mut channels = self.channels.write().await;

        if let Some(sender) = channels.get(collection) {
            debug!(
                collection,
                subscribers = sender.receiver_count() + 1,
                "Added change subscriber"
            );
            return sender.subscribe();
        }

        let (sender, receiver) = broadcast::channel(self.buffer);
        channels.insert(collection.to_string(), sender);
        info!(collection, "Created change channel");
        receiver
    }

    /// Returns true if at least one subscriber received the event.
    pub async fn publish(&self, collection: &str, document_id: Uuid) -> bool {
        let mut channels = self.channels.write().await;

        let Some(sender) = channels.get(collection) else {
            debug!(collection, %document_id, "No change subscribers");
            return false;
        };

        let event = ChangeEvent {
            collection: collection.to_string(),
            document_id,
        };

        match sender.send(event) {
            Ok(receivers) => {
                debug!(collection, %document_id, receivers, "Change published");
                true
            }
            Err(_) => {
                channels.remove(collection);
                debug!(collection, "Removed change channel without receivers");
                false
            }
        }
    }

    pub async fn subscriber_count(&self, collection: &str) -> usize {
        let channels = self.channels.read().await;
        channels
            .get(collection)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for CollectionChanges {
    fn default() -> Self {
        Self::new(64)
    }
}
