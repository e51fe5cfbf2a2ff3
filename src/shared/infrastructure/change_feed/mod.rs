// Change notification port.
//
// Purpose
// - Describe the realtime "something changed" channels the live order engine listens to.
//
// Boundaries
// - Notifications carry no payload guarantee. Consumers only learn which collection changed and how.

pub mod in_memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    TabItems,
    CounterOrderItems,
    CounterOrders,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::TabItems => "tab_items",
            Collection::CounterOrderItems => "counter_order_items",
            Collection::CounterOrders => "counter_orders",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub collection: Collection,
    pub kind: ChangeKind,
}

#[derive(Debug, Error)]
pub enum ChangeFeedError {
    #[error("change feed unavailable: {0}")]
    Unavailable(String),
}

pub trait ChangeFeed: Send + Sync {
    /// Opens a receiver for every notification on `collection`.
    fn subscribe(
        &self,
        collection: Collection,
    ) -> Result<broadcast::Receiver<ChangeNotification>, ChangeFeedError>;
}
