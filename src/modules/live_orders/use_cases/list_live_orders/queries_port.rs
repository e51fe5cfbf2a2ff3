use crate::modules::live_orders::core::logical_order::LogicalOrder;
use crate::modules::live_orders::use_cases::list_live_orders::projection::LiveOrdersSnapshot;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait LiveOrderQueries: Send + Sync {
    async fn snapshot(&self) -> anyhow::Result<Arc<LiveOrdersSnapshot>>;

    async fn list(&self) -> anyhow::Result<Vec<LogicalOrder>> {
        Ok(self.snapshot().await?.orders.clone())
    }

    async fn find(&self, order_id: &str) -> anyhow::Result<Option<LogicalOrder>> {
        Ok(self.snapshot().await?.find(order_id).cloned())
    }
}
