// In memory live order store.
//
// Purpose
// - Hold the last published snapshot and hand it to readers.
//
// Responsibilities
// - Replace the snapshot as a whole. Readers only ever hold a complete `Arc<LiveOrdersSnapshot>`.
// - Notify subscribers on every swap.

use crate::modules::live_orders::adapters::outbound::projections::LiveOrdersProjectionRepository;
use crate::modules::live_orders::core::logical_order::LogicalOrder;
use crate::modules::live_orders::use_cases::list_live_orders::projection::LiveOrdersSnapshot;
use crate::modules::live_orders::use_cases::list_live_orders::queries_port::LiveOrderQueries;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

pub struct InMemoryLiveOrders {
    snapshot: watch::Sender<Arc<LiveOrdersSnapshot>>,
    is_offline: bool,
}

impl Default for InMemoryLiveOrders {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLiveOrders {
    pub fn new() -> Self {
        Self::seeded(LiveOrdersSnapshot::default())
    }

    /// A store whose first snapshot already reports a run in progress.
    pub fn loading() -> Self {
        Self::seeded(LiveOrdersSnapshot {
            is_loading: true,
            ..LiveOrdersSnapshot::default()
        })
    }

    fn seeded(initial: LiveOrdersSnapshot) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(initial));
        Self {
            snapshot,
            is_offline: false,
        }
    }

    pub fn toggle_offline(&mut self) {
        self.is_offline = !self.is_offline;
    }

    pub fn current(&self) -> Arc<LiveOrdersSnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<LiveOrdersSnapshot>> {
        self.snapshot.subscribe()
    }

    fn swap(&self, next: impl FnOnce(&LiveOrdersSnapshot) -> LiveOrdersSnapshot) -> anyhow::Result<()> {
        if self.is_offline {
            return Err(anyhow!("Live orders store offline"));
        }
        self.snapshot.send_modify(|current| {
            *current = Arc::new(next(&**current));
        });
        Ok(())
    }
}

#[async_trait::async_trait]
impl LiveOrdersProjectionRepository for InMemoryLiveOrders {
    async fn mark_loading(&self) -> anyhow::Result<()> {
        self.swap(|current| LiveOrdersSnapshot {
            is_loading: true,
            ..current.clone()
        })
    }

    async fn replace(
        &self,
        orders: Vec<LogicalOrder>,
        refreshed_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.swap(move |current| LiveOrdersSnapshot {
            orders,
            is_loading: false,
            error: None,
            refreshed_at: Some(refreshed_at),
            generation: current.generation + 1,
        })
    }

    async fn record_failure(&self, message: &str) -> anyhow::Result<()> {
        self.swap(|current| LiveOrdersSnapshot {
            is_loading: false,
            error: Some(message.to_string()),
            ..current.clone()
        })
    }
}

#[async_trait::async_trait]
impl LiveOrderQueries for InMemoryLiveOrders {
    async fn snapshot(&self) -> anyhow::Result<Arc<LiveOrdersSnapshot>> {
        if self.is_offline {
            return Err(anyhow!("Live orders store offline"));
        }
        Ok(self.current())
    }
}

#[cfg(test)]
mod in_memory_live_orders_tests {
    use super::*;
    use crate::modules::live_orders::core::reconstruct::rebuild;
    use crate::tests::fixtures::rows::{SourcedLineItemBuilder, at, tab};
    use rstest::{fixture, rstest};

    #[fixture]
    fn before_each() -> (Vec<LogicalOrder>, InMemoryLiveOrders) {
        let table = tab("tab-4", "4");
        let orders = rebuild(vec![
            SourcedLineItemBuilder::tab_item("li-1", &table).build(),
        ])
        .orders;
        (orders, InMemoryLiveOrders::new())
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_start_empty_and_idle(before_each: (Vec<LogicalOrder>, InMemoryLiveOrders)) {
        let (_, store) = before_each;
        let snapshot = store.snapshot().await.unwrap();
        assert!(snapshot.orders.is_empty());
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.generation, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_start_loading_when_created_for_a_pending_run(
        before_each: (Vec<LogicalOrder>, InMemoryLiveOrders),
    ) {
        let (orders, _) = before_each;
        let store = InMemoryLiveOrders::loading();
        let snapshot = store.snapshot().await.unwrap();
        assert!(snapshot.is_loading);
        assert!(snapshot.orders.is_empty());
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.generation, 0);

        store
            .replace(orders, at("2026-10-16T12:00:00Z"))
            .await
            .unwrap();
        assert!(!store.current().is_loading);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_replace_the_orders_and_clear_errors(
        before_each: (Vec<LogicalOrder>, InMemoryLiveOrders),
    ) {
        let (orders, store) = before_each;
        store.record_failure("boom").await.unwrap();
        store.mark_loading().await.unwrap();
        store
            .replace(orders.clone(), at("2026-10-16T12:00:00Z"))
            .await
            .unwrap();

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.orders, orders);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.refreshed_at, Some(at("2026-10-16T12:00:00Z")));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_keep_previous_orders_on_failure(
        before_each: (Vec<LogicalOrder>, InMemoryLiveOrders),
    ) {
        let (orders, store) = before_each;
        store
            .replace(orders.clone(), at("2026-10-16T12:00:00Z"))
            .await
            .unwrap();
        store.mark_loading().await.unwrap();
        assert!(store.current().is_loading);

        store.record_failure("counter fetch failed").await.unwrap();

        let snapshot = store.current();
        assert_eq!(snapshot.orders, orders);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.error.as_deref(), Some("counter fetch failed"));
        assert_eq!(snapshot.generation, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_not_disturb_snapshots_already_held_by_readers(
        before_each: (Vec<LogicalOrder>, InMemoryLiveOrders),
    ) {
        let (orders, store) = before_each;
        let held = store.current();
        store
            .replace(orders, at("2026-10-16T12:00:00Z"))
            .await
            .unwrap();
        assert!(held.orders.is_empty());
        assert_eq!(store.current().orders.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_notify_subscribers_of_each_swap(
        before_each: (Vec<LogicalOrder>, InMemoryLiveOrders),
    ) {
        let (orders, store) = before_each;
        let mut receiver = store.subscribe();
        store
            .replace(orders, at("2026-10-16T12:00:00Z"))
            .await
            .unwrap();
        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow().generation, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_find_an_order_by_id(before_each: (Vec<LogicalOrder>, InMemoryLiveOrders)) {
        let (orders, store) = before_each;
        let id = orders[0].id.clone();
        store
            .replace(orders, at("2026-10-16T12:00:00Z"))
            .await
            .unwrap();
        assert!(store.find(&id).await.unwrap().is_some());
        assert!(store.find("counter:missing").await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_if_the_store_is_offline(
        before_each: (Vec<LogicalOrder>, InMemoryLiveOrders),
    ) {
        let (orders, mut store) = before_each;
        store.toggle_offline();
        let result = store.replace(orders, at("2026-10-16T12:00:00Z")).await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Live orders store offline")
        );
        assert!(store.snapshot().await.is_err());
    }
}
