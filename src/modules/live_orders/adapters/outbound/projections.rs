use crate::modules::live_orders::core::logical_order::LogicalOrder;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Write side of the live order read model. Only the refresh pipeline calls it.
#[async_trait]
pub trait LiveOrdersProjectionRepository: Send + Sync {
    async fn mark_loading(&self) -> anyhow::Result<()>;

    /// Swaps in a new order set and clears any previous error.
    async fn replace(
        &self,
        orders: Vec<LogicalOrder>,
        refreshed_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    /// Keeps the current orders and records why the run failed.
    async fn record_failure(&self, message: &str) -> anyhow::Result<()>;
}
