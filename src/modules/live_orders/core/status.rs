// Status reconciliation for logical orders.
//
// Purpose
// - Translate source-native status strings into the normalized lifecycle.
// - Pick one status per logical order from its members or its parent record.
//
// Responsibilities
// - Never fail. Unknown or missing values map to Pending.

use crate::modules::live_orders::core::line_item::{CounterOrder, LineItem};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Exact lookup in the mapping table. `None` for anything the table does not name.
    pub fn recognize(raw: &str) -> Option<OrderStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "new" | "open" | "placed" => Some(OrderStatus::Pending),
            "preparing" | "in_progress" | "cooking" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "delivered" | "served" | "completed" | "done" => Some(OrderStatus::Delivered),
            "cancelled" | "canceled" | "void" | "voided" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn normalize(raw: Option<&str>) -> OrderStatus {
        raw.and_then(OrderStatus::recognize).unwrap_or_default()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    pub status: OrderStatus,
    pub recognized: bool,
}

impl Reconciled {
    fn from_raw(raw: Option<&str>) -> Self {
        match raw.and_then(OrderStatus::recognize) {
            Some(status) => Self {
                status,
                recognized: true,
            },
            None => Self {
                status: OrderStatus::Pending,
                recognized: false,
            },
        }
    }
}

/// Table-service groups take the status of their last-ordered item.
pub fn reconcile_table_service<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> Reconciled {
    let last = items
        .into_iter()
        .max_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then_with(|| a.id.cmp(&b.id)));
    Reconciled::from_raw(last.and_then(|item| item.status.as_deref()))
}

/// Counter orders take their parent's status, whatever the items say.
pub fn reconcile_counter(order: &CounterOrder) -> Reconciled {
    Reconciled::from_raw(Some(order.status.as_str()))
}
