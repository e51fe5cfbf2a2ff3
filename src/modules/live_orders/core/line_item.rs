// Raw source records as the backing store returns them, already joined to their parent and catalog entry.
//
// Purpose
// - Model the two independent line-item collections (tab items, counter order items).
//
// Boundaries
// - The engine never writes these back. They are read-only inputs to the rebuild.

use crate::modules::live_orders::core::catalog::CatalogRef;
use crate::modules::live_orders::core::logical_order::SourceKind;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub menu_item_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    /// "added" time for tab items, "created" time for counter items.
    pub recorded_at: DateTime<Utc>,
    /// Item-level status. Only table-service items carry one that matters.
    #[serde(default)]
    pub status: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: String,
    pub table_label: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub opened_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterOrder {
    pub id: String,
    pub order_number: u32,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParentRecord {
    Tab(Tab),
    Counter(CounterOrder),
}

impl ParentRecord {
    pub fn kind(&self) -> SourceKind {
        match self {
            ParentRecord::Tab(_) => SourceKind::TableService,
            ParentRecord::Counter(_) => SourceKind::Counter,
        }
    }
}

/// One fetched row: the line item plus whatever the joins resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedLineItem {
    pub item: LineItem,
    pub parent: Option<ParentRecord>,
    pub catalog: Option<CatalogRef>,
}
