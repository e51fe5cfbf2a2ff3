// In memory implementation of the ChangeFeed port.
//
// Purpose
// - Let the in memory backing store announce writes the way a realtime transport would.
//
// Responsibilities
// - Keep one broadcast channel per collection.
// - Report how many receivers are attached so tests can assert teardown.

use crate::shared::infrastructure::change_feed::{
    ChangeFeed, ChangeFeedError, ChangeKind, ChangeNotification, Collection,
};
use std::collections::HashMap;
use tokio::sync::broadcast;

pub struct InMemoryChangeFeed {
    channels: HashMap<Collection, broadcast::Sender<ChangeNotification>>,
    is_offline: bool,
}

impl InMemoryChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let channels = [
            Collection::TabItems,
            Collection::CounterOrderItems,
            Collection::CounterOrders,
        ]
        .into_iter()
        .map(|collection| (collection, broadcast::channel(capacity).0))
        .collect();
        Self {
            channels,
            is_offline: false,
        }
    }

    pub fn toggle_offline(&mut self) {
        self.is_offline = !self.is_offline;
    }

    /// Announces a change. Returns how many receivers saw it.
    pub fn publish(&self, collection: Collection, kind: ChangeKind) -> usize {
        let Some(sender) = self.channels.get(&collection) else {
            return 0;
        };
        sender
            .send(ChangeNotification { collection, kind })
            .unwrap_or(0)
    }

    pub fn receiver_count(&self, collection: Collection) -> usize {
        self.channels
            .get(&collection)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for InMemoryChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ChangeFeed for InMemoryChangeFeed {
    fn subscribe(
        &self,
        collection: Collection,
    ) -> Result<broadcast::Receiver<ChangeNotification>, ChangeFeedError> {
        if self.is_offline {
            return Err(ChangeFeedError::Unavailable("Change feed offline".into()));
        }
        self.channels
            .get(&collection)
            .map(|sender| sender.subscribe())
            .ok_or_else(|| {
                ChangeFeedError::Unavailable(format!("no channel for {}", collection.as_str()))
            })
    }
}
