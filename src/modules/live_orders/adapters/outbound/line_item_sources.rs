// Line item source port.
//
// Purpose
// - Read today's line items of one source kind, each joined to its parent record and catalog entry.
//
// Boundaries
// - Read only. Adapters never write back to the backing store.
// - Results are sorted newest first (ties by line item id) so a run sees a stable order.

use crate::modules::live_orders::core::line_item::SourcedLineItem;
use crate::modules::live_orders::core::logical_order::SourceKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch {source_kind} line items: {message}")]
pub struct SourceFetchError {
    pub source_kind: SourceKind,
    pub message: String,
}

impl SourceFetchError {
    pub fn new(source_kind: SourceKind, message: impl Into<String>) -> Self {
        Self {
            source_kind,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait LineItemSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn fetch_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourcedLineItem>, SourceFetchError>;
}

pub fn sort_newest_first(rows: &mut [SourcedLineItem]) {
    rows.sort_by(|a, b| {
        b.item
            .recorded_at
            .cmp(&a.item.recorded_at)
            .then_with(|| b.item.id.cmp(&a.item.id))
    });
}
