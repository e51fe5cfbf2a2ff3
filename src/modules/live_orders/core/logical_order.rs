// Read model of the live order engine.
//
// Purpose
// - Represent one reconstructed order: its origin, member items, status and total.
//
// Responsibilities
// - Keep `total` derivable from `items`. It is only ever computed by the rebuild.

use crate::modules::live_orders::core::status::OrderStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    TableService,
    Counter,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::TableService => "table_service",
            SourceKind::Counter => "counter",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemView {
    pub line_item_id: String,
    pub menu_item_id: String,
    pub name: String,
    pub category: Option<String>,
    pub preparation_time_minutes: Option<u32>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalOrder {
    pub id: String,
    pub source_kind: SourceKind,
    pub origin_label: String,
    pub items: Vec<LineItemView>,
    pub status: OrderStatus,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub last_touched_at: DateTime<Utc>,
    pub note: String,
}

impl LogicalOrder {
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
