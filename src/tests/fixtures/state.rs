// Shared application state for inbound surface tests.

use crate::modules::live_orders::adapters::outbound::backing_store_in_memory::InMemoryBackingStore;
use crate::shared::core::primitives::FixedClock;
use crate::shared::infrastructure::change_feed::in_memory::InMemoryChangeFeed;
use crate::shell::state::AppState;
use crate::shell::workers::{EngineSources, LiveOrdersEngine};
use crate::tests::fixtures::rows::{at, catalog_entry, counter_order, line_item, tab};
use chrono::FixedOffset;
use std::sync::Arc;

/// One table-service order ("tab:tab-4:202610161200") and one counter order ("counter:co-107").
pub async fn seeded_backing_store() -> Arc<InMemoryBackingStore> {
    let backing = Arc::new(InMemoryBackingStore::new(Arc::new(InMemoryChangeFeed::new(64))));
    backing.upsert_catalog_entry(catalog_entry("menu-1", "Burger")).await;
    backing.upsert_tab(tab("tab-4", "4")).await;
    backing.upsert_counter_order(counter_order("co-107", 107)).await;
    backing
        .insert_tab_item("tab-4", line_item("li-1", "menu-1", at("2026-10-16T12:00:10Z")))
        .await;
    backing
        .insert_counter_item("co-107", line_item("li-2", "menu-1", at("2026-10-16T11:30:00Z")))
        .await;
    backing
}

pub fn make_test_state(backing: &Arc<InMemoryBackingStore>) -> AppState {
    let sources = EngineSources {
        table_service: Arc::new(backing.table_service_source()),
        counter: Arc::new(backing.counter_source()),
        clock: Arc::new(FixedClock::new(at("2026-10-16T12:30:00Z"))),
        venue_offset: FixedOffset::east_opt(0).unwrap(),
    };
    let engine = LiveOrdersEngine::start(sources, backing.feed().as_ref()).unwrap();
    AppState::new(Arc::new(engine))
}
