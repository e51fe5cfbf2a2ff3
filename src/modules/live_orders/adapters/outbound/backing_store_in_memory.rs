// In memory backing store for tabs, counter orders, the menu catalog and both line item collections.
//
// Purpose
// - Stand in for the remote data store in tests and local development.
//
// Responsibilities
// - Answer the two line item queries (tab items, counter order items) with their joins applied.
// - Announce every write on the attached change feed, like the realtime transport would.
// - Fail a single source on demand so atomic failure can be exercised.

use crate::modules::live_orders::adapters::outbound::line_item_sources::{
    LineItemSource, SourceFetchError, sort_newest_first,
};
use crate::modules::live_orders::core::catalog::CatalogEntry;
use crate::modules::live_orders::core::line_item::{
    CounterOrder, LineItem, ParentRecord, SourcedLineItem, Tab,
};
use crate::modules::live_orders::core::logical_order::SourceKind;
use crate::shared::infrastructure::change_feed::in_memory::InMemoryChangeFeed;
use crate::shared::infrastructure::change_feed::{ChangeKind, Collection};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredItem {
    parent_id: String,
    item: LineItem,
}

#[derive(Default)]
struct Tables {
    tabs: HashMap<String, Tab>,
    counter_orders: HashMap<String, CounterOrder>,
    catalog: HashMap<String, CatalogEntry>,
    inventory_names: HashMap<String, String>,
    tab_items: Vec<StoredItem>,
    counter_items: Vec<StoredItem>,
}

impl Tables {
    fn join(&self, kind: SourceKind, stored: &StoredItem) -> SourcedLineItem {
        let parent = match kind {
            SourceKind::TableService => self
                .tabs
                .get(&stored.parent_id)
                .cloned()
                .map(ParentRecord::Tab),
            SourceKind::Counter => self
                .counter_orders
                .get(&stored.parent_id)
                .cloned()
                .map(ParentRecord::Counter),
        };
        let catalog = self.catalog.get(&stored.item.menu_item_id).map(|entry| {
            let inventory_name = entry
                .inventory_item_id
                .as_ref()
                .and_then(|id| self.inventory_names.get(id))
                .map(String::as_str);
            entry.resolve(inventory_name)
        });
        SourcedLineItem {
            item: stored.item.clone(),
            parent,
            catalog,
        }
    }

    fn items(&self, kind: SourceKind) -> &Vec<StoredItem> {
        match kind {
            SourceKind::TableService => &self.tab_items,
            SourceKind::Counter => &self.counter_items,
        }
    }

    fn items_mut(&mut self, kind: SourceKind) -> &mut Vec<StoredItem> {
        match kind {
            SourceKind::TableService => &mut self.tab_items,
            SourceKind::Counter => &mut self.counter_items,
        }
    }
}

fn item_collection(kind: SourceKind) -> Collection {
    match kind {
        SourceKind::TableService => Collection::TabItems,
        SourceKind::Counter => Collection::CounterOrderItems,
    }
}

pub struct InMemoryBackingStore {
    tables: RwLock<Tables>,
    feed: Arc<InMemoryChangeFeed>,
    table_service_offline: AtomicBool,
    counter_offline: AtomicBool,
    fetch_delay_ms: AtomicU64,
}

impl InMemoryBackingStore {
    pub fn new(feed: Arc<InMemoryChangeFeed>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            feed,
            table_service_offline: AtomicBool::new(false),
            counter_offline: AtomicBool::new(false),
            fetch_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn feed(&self) -> Arc<InMemoryChangeFeed> {
        self.feed.clone()
    }

    fn offline_flag(&self, kind: SourceKind) -> &AtomicBool {
        match kind {
            SourceKind::TableService => &self.table_service_offline,
            SourceKind::Counter => &self.counter_offline,
        }
    }

    pub fn toggle_offline(&self, kind: SourceKind) {
        self.offline_flag(kind).fetch_xor(true, Ordering::SeqCst);
    }

    pub fn is_offline(&self, kind: SourceKind) -> bool {
        self.offline_flag(kind).load(Ordering::SeqCst)
    }

    /// Slows every fetch down, so tests can land triggers while a run is in flight.
    pub fn set_fetch_delay_ms(&self, delay_ms: u64) {
        self.fetch_delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    pub fn table_service_source(self: &Arc<Self>) -> TableServiceItems {
        TableServiceItems {
            store: self.clone(),
        }
    }

    pub fn counter_source(self: &Arc<Self>) -> CounterOrderItems {
        CounterOrderItems {
            store: self.clone(),
        }
    }

    pub async fn upsert_catalog_entry(&self, entry: CatalogEntry) {
        self.tables
            .write()
            .await
            .catalog
            .insert(entry.id.clone(), entry);
    }

    pub async fn set_inventory_name(&self, inventory_item_id: &str, name: &str) {
        self.tables
            .write()
            .await
            .inventory_names
            .insert(inventory_item_id.to_string(), name.to_string());
    }

    pub async fn upsert_tab(&self, tab: Tab) {
        self.tables.write().await.tabs.insert(tab.id.clone(), tab);
    }

    pub async fn upsert_counter_order(&self, order: CounterOrder) {
        let previous = self
            .tables
            .write()
            .await
            .counter_orders
            .insert(order.id.clone(), order);
        let kind = if previous.is_some() {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        self.feed.publish(Collection::CounterOrders, kind);
    }

    pub async fn set_counter_order_status(&self, order_id: &str, status: &str) -> anyhow::Result<()> {
        {
            let mut tables = self.tables.write().await;
            let order = tables
                .counter_orders
                .get_mut(order_id)
                .ok_or_else(|| anyhow!("counter order {order_id} not found"))?;
            order.status = status.to_string();
        }
        self.feed.publish(Collection::CounterOrders, ChangeKind::Update);
        Ok(())
    }

    pub async fn insert_tab_item(&self, tab_id: &str, item: LineItem) {
        self.insert_item(SourceKind::TableService, tab_id, item).await;
    }

    pub async fn insert_counter_item(&self, order_id: &str, item: LineItem) {
        self.insert_item(SourceKind::Counter, order_id, item).await;
    }

    async fn insert_item(&self, kind: SourceKind, parent_id: &str, item: LineItem) {
        self.tables.write().await.items_mut(kind).push(StoredItem {
            parent_id: parent_id.to_string(),
            item,
        });
        self.feed.publish(item_collection(kind), ChangeKind::Insert);
    }

    pub async fn set_item_status(
        &self,
        kind: SourceKind,
        line_item_id: &str,
        status: &str,
    ) -> anyhow::Result<()> {
        {
            let mut tables = self.tables.write().await;
            let stored = tables
                .items_mut(kind)
                .iter_mut()
                .find(|stored| stored.item.id == line_item_id)
                .ok_or_else(|| anyhow!("{kind} line item {line_item_id} not found"))?;
            stored.item.status = Some(status.to_string());
        }
        self.feed.publish(item_collection(kind), ChangeKind::Update);
        Ok(())
    }

    pub async fn remove_item(&self, kind: SourceKind, line_item_id: &str) -> anyhow::Result<()> {
        {
            let mut tables = self.tables.write().await;
            let items = tables.items_mut(kind);
            let before = items.len();
            items.retain(|stored| stored.item.id != line_item_id);
            if items.len() == before {
                return Err(anyhow!("{kind} line item {line_item_id} not found"));
            }
        }
        self.feed.publish(item_collection(kind), ChangeKind::Delete);
        Ok(())
    }

    /// Loads seed data without announcing it.
    pub async fn seed(&self, data: SeedData, now: DateTime<Utc>) {
        let mut tables = self.tables.write().await;
        for entry in data.catalog {
            tables.catalog.insert(entry.id.clone(), entry);
        }
        tables.inventory_names.extend(data.inventory_names);
        for tab in data.tabs {
            tables.tabs.insert(tab.id.clone(), tab);
        }
        for order in data.counter_orders {
            tables.counter_orders.insert(order.id.clone(), order);
        }
        for seed in data.tab_items {
            let stored = seed.into_stored(now);
            tables.tab_items.push(stored);
        }
        for seed in data.counter_items {
            let stored = seed.into_stored(now);
            tables.counter_items.push(stored);
        }
    }

    async fn fetch(
        &self,
        kind: SourceKind,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourcedLineItem>, SourceFetchError> {
        let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.is_offline(kind) {
            return Err(SourceFetchError::new(kind, "Backing store offline"));
        }
        let tables = self.tables.read().await;
        let mut rows: Vec<SourcedLineItem> = tables
            .items(kind)
            .iter()
            .filter(|stored| stored.item.recorded_at >= since)
            .map(|stored| tables.join(kind, stored))
            .collect();
        sort_newest_first(&mut rows);
        Ok(rows)
    }
}

pub struct TableServiceItems {
    store: Arc<InMemoryBackingStore>,
}

#[async_trait]
impl LineItemSource for TableServiceItems {
    fn kind(&self) -> SourceKind {
        SourceKind::TableService
    }

    async fn fetch_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourcedLineItem>, SourceFetchError> {
        self.store.fetch(SourceKind::TableService, since).await
    }
}

pub struct CounterOrderItems {
    store: Arc<InMemoryBackingStore>,
}

#[async_trait]
impl LineItemSource for CounterOrderItems {
    fn kind(&self) -> SourceKind {
        SourceKind::Counter
    }

    async fn fetch_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourcedLineItem>, SourceFetchError> {
        self.store.fetch(SourceKind::Counter, since).await
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
    #[serde(default)]
    pub inventory_names: HashMap<String, String>,
    #[serde(default)]
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub counter_orders: Vec<CounterOrder>,
    #[serde(default)]
    pub tab_items: Vec<SeedItem>,
    #[serde(default)]
    pub counter_items: Vec<SeedItem>,
}

impl SeedData {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedItem {
    pub parent_id: String,
    pub id: String,
    pub menu_item_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Defaults to the load time so seeded items count as today's.
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl SeedItem {
    fn into_stored(self, now: DateTime<Utc>) -> StoredItem {
        StoredItem {
            parent_id: self.parent_id,
            item: LineItem {
                id: self.id,
                menu_item_id: self.menu_item_id,
                quantity: self.quantity,
                unit_price: self.unit_price,
                notes: self.notes,
                recorded_at: self.recorded_at.unwrap_or(now),
                status: self.status,
            },
        }
    }
}
