// Rebuild logical orders from today's line items.
//
// Purpose
// - Group flat line items into logical orders using one correlation rule per source.
// - Derive each order's total, timestamps, labels and status from its members.
//
// Responsibilities
// - Stay pure. The same rows always produce the same orders, in the same order.
// - Drop rows without a parent record. Degrade missing catalog entries to a placeholder name.
//
// Correlation
// - Counter items group by their parent order id.
// - Tab items carry no order id. They group by tab id plus the minute their `recorded_at`
//   falls in, so two rounds ordered a minute apart land in two different logical orders.

use crate::modules::live_orders::core::catalog::{CatalogRef, placeholder_name};
use crate::modules::live_orders::core::line_item::{LineItem, ParentRecord, SourcedLineItem};
use crate::modules::live_orders::core::logical_order::{LineItemView, LogicalOrder};
use crate::modules::live_orders::core::status::{
    OrderStatus, reconcile_counter, reconcile_table_service,
};
use crate::shared::core::primitives::minute_bucket;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CorrelationKey {
    Tab {
        tab_id: String,
        bucket: DateTime<Utc>,
    },
    Counter {
        order_id: String,
    },
}

impl CorrelationKey {
    pub fn for_item(parent: &ParentRecord, item: &LineItem) -> Self {
        match parent {
            ParentRecord::Tab(tab) => CorrelationKey::Tab {
                tab_id: tab.id.clone(),
                bucket: minute_bucket(item.recorded_at),
            },
            ParentRecord::Counter(order) => CorrelationKey::Counter {
                order_id: order.id.clone(),
            },
        }
    }

    /// Synthetic logical order id. Stable for as long as the key is.
    pub fn order_id(&self) -> String {
        match self {
            CorrelationKey::Tab { tab_id, bucket } => {
                format!("tab:{tab_id}:{}", bucket.format("%Y%m%d%H%M"))
            }
            CorrelationKey::Counter { order_id } => format!("counter:{order_id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildStats {
    pub line_items: usize,
    pub orders: usize,
    pub dropped_orphans: usize,
    pub catalog_misses: usize,
    pub unknown_statuses: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    pub orders: Vec<LogicalOrder>,
    pub stats: RebuildStats,
}

struct Group {
    parent: ParentRecord,
    members: Vec<(LineItem, Option<CatalogRef>)>,
}

pub fn rebuild(rows: impl IntoIterator<Item = SourcedLineItem>) -> Reconstruction {
    let mut stats = RebuildStats::default();
    let mut groups: BTreeMap<CorrelationKey, Group> = BTreeMap::new();

    for SourcedLineItem {
        item,
        parent,
        catalog,
    } in rows
    {
        stats.line_items += 1;
        let Some(parent) = parent else {
            stats.dropped_orphans += 1;
            tracing::debug!(line_item_id = %item.id, "dropping line item without a parent record");
            continue;
        };
        let key = CorrelationKey::for_item(&parent, &item);
        groups
            .entry(key)
            .or_insert_with(|| Group {
                parent,
                members: Vec::new(),
            })
            .members
            .push((item, catalog));
    }

    let mut orders: Vec<LogicalOrder> = groups
        .into_iter()
        .map(|(key, group)| emit(&key, group, &mut stats))
        .collect();
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    stats.orders = orders.len();

    Reconstruction { orders, stats }
}

fn emit(key: &CorrelationKey, group: Group, stats: &mut RebuildStats) -> LogicalOrder {
    let Group {
        parent,
        mut members,
    } = group;
    members.sort_by(|(a, _), (b, _)| {
        a.recorded_at
            .cmp(&b.recorded_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let reconciled = match &parent {
        ParentRecord::Tab(_) => reconcile_table_service(members.iter().map(|(item, _)| item)),
        ParentRecord::Counter(order) => reconcile_counter(order),
    };
    if !reconciled.recognized {
        stats.unknown_statuses += 1;
    }

    let items: Vec<LineItemView> = members
        .into_iter()
        .map(|(item, catalog)| {
            let status = match &parent {
                ParentRecord::Tab(_) => OrderStatus::normalize(item.status.as_deref()),
                ParentRecord::Counter(_) => reconciled.status,
            };
            view(item, catalog, status, stats)
        })
        .collect();

    let total: Decimal = items.iter().map(|item| item.line_total).sum();
    let (fallback_time, origin_label, note) = describe(&parent);
    let created_at = items
        .iter()
        .map(|item| item.recorded_at)
        .min()
        .unwrap_or(fallback_time);
    let last_touched_at = items
        .iter()
        .map(|item| item.recorded_at)
        .max()
        .unwrap_or(created_at);

    LogicalOrder {
        id: key.order_id(),
        source_kind: parent.kind(),
        origin_label,
        items,
        status: reconciled.status,
        total,
        created_at,
        last_touched_at,
        note,
    }
}

fn view(
    item: LineItem,
    catalog: Option<CatalogRef>,
    status: OrderStatus,
    stats: &mut RebuildStats,
) -> LineItemView {
    let name = match catalog.as_ref().and_then(CatalogRef::name) {
        Some(name) => name.to_string(),
        None => {
            stats.catalog_misses += 1;
            tracing::debug!(
                line_item_id = %item.id,
                menu_item_id = %item.menu_item_id,
                "catalog entry unresolved, using placeholder name"
            );
            placeholder_name(&item.menu_item_id)
        }
    };
    let line_total = item.line_total();
    LineItemView {
        line_item_id: item.id,
        menu_item_id: item.menu_item_id,
        name,
        category: catalog.as_ref().and_then(|c| c.category.clone()),
        preparation_time_minutes: catalog.as_ref().and_then(|c| c.preparation_time_minutes),
        quantity: item.quantity,
        unit_price: item.unit_price,
        line_total,
        notes: item.notes,
        recorded_at: item.recorded_at,
        status,
    }
}

fn with_customer(base: String, customer_name: Option<&str>) -> String {
    match customer_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("{base} - {name}"),
        None => base,
    }
}

fn describe(parent: &ParentRecord) -> (DateTime<Utc>, String, String) {
    match parent {
        ParentRecord::Tab(tab) => {
            let label = format!("Table {}", tab.table_label);
            let note = with_customer(label.clone(), tab.customer_name.as_deref());
            (tab.opened_at, label, note)
        }
        ParentRecord::Counter(order) => {
            let note = with_customer(
                format!("Order #{}", order.order_number),
                order.customer_name.as_deref(),
            );
            (order.created_at, "Counter".to_string(), note)
        }
    }
}
