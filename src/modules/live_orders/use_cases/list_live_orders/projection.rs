use crate::modules::live_orders::core::logical_order::LogicalOrder;
use chrono::{DateTime, Utc};

/// One complete, internally consistent result of the live order pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct LiveOrdersSnapshot {
    pub orders: Vec<LogicalOrder>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Number of successful publishes so far.
    pub generation: u64,
}

impl LiveOrdersSnapshot {
    pub fn find(&self, order_id: &str) -> Option<&LogicalOrder> {
        self.orders.iter().find(|order| order.id == order_id)
    }
}
