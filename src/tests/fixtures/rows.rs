// Shared test fixtures for source rows.
// Compiled into the crate only during tests (see `src/lib.rs`).

use crate::modules::live_orders::core::catalog::{CatalogEntry, CatalogEntryKind, CatalogRef};
use crate::modules::live_orders::core::line_item::{
    CounterOrder, LineItem, ParentRecord, SourcedLineItem, Tab,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn tab(id: &str, table_label: &str) -> Tab {
    Tab {
        id: id.to_string(),
        table_label: table_label.to_string(),
        customer_name: None,
        opened_at: at("2026-10-16T11:00:00Z"),
        status: "open".to_string(),
    }
}

pub fn counter_order(id: &str, order_number: u32) -> CounterOrder {
    CounterOrder {
        id: id.to_string(),
        order_number,
        customer_name: None,
        created_at: at("2026-10-16T11:00:00Z"),
        status: "pending".to_string(),
    }
}

/// One unit at 1.00, no notes, no status.
pub fn line_item(id: &str, menu_item_id: &str, recorded_at: DateTime<Utc>) -> LineItem {
    LineItem {
        id: id.to_string(),
        menu_item_id: menu_item_id.to_string(),
        quantity: 1,
        unit_price: Decimal::new(100, 2),
        notes: None,
        recorded_at,
        status: None,
    }
}

pub fn catalog_entry(id: &str, display_name: &str) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        display_name: display_name.to_string(),
        category: Some("Mains".to_string()),
        preparation_time_minutes: Some(10),
        kind: CatalogEntryKind::Prepared,
        inventory_item_id: None,
    }
}

/// Builds joined rows the way a line item source returns them.
pub struct SourcedLineItemBuilder {
    item: LineItem,
    parent: Option<ParentRecord>,
    with_catalog: bool,
}

#[allow(dead_code)]
impl SourcedLineItemBuilder {
    fn new(id: &str, parent: Option<ParentRecord>) -> Self {
        Self {
            item: line_item(id, "menu-1", at("2026-10-16T12:00:00Z")),
            parent,
            with_catalog: true,
        }
    }

    pub fn tab_item(id: &str, tab: &Tab) -> Self {
        Self::new(id, Some(ParentRecord::Tab(tab.clone())))
    }

    pub fn counter_item(id: &str, order: &CounterOrder) -> Self {
        Self::new(id, Some(ParentRecord::Counter(order.clone())))
    }

    /// A row whose parent join came back empty.
    pub fn orphan(id: &str) -> Self {
        Self::new(id, None)
    }

    pub fn recorded_at(mut self, v: DateTime<Utc>) -> Self {
        self.item.recorded_at = v;
        self
    }

    pub fn price(mut self, unit_price: Decimal, quantity: u32) -> Self {
        self.item.unit_price = unit_price;
        self.item.quantity = quantity;
        self
    }

    pub fn menu_item_id(mut self, v: impl Into<String>) -> Self {
        self.item.menu_item_id = v.into();
        self
    }

    pub fn notes(mut self, v: impl Into<String>) -> Self {
        self.item.notes = Some(v.into());
        self
    }

    pub fn item_status(mut self, v: impl Into<String>) -> Self {
        self.item.status = Some(v.into());
        self
    }

    pub fn without_catalog(mut self) -> Self {
        self.with_catalog = false;
        self
    }

    pub fn build(self) -> SourcedLineItem {
        let catalog = self.with_catalog.then(|| CatalogRef {
            id: self.item.menu_item_id.clone(),
            display_name: Some("Burger".to_string()),
            category: Some("Mains".to_string()),
            preparation_time_minutes: Some(10),
        });
        SourcedLineItem {
            item: self.item,
            parent: self.parent,
            catalog,
        }
    }
}

#[cfg(test)]
mod sourced_line_item_builder_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_join_a_catalog_entry_for_the_menu_item() {
        let row = SourcedLineItemBuilder::tab_item("li-1", &tab("tab-1", "1"))
            .menu_item_id("menu-9")
            .build();
        assert_eq!(row.catalog.unwrap().id, "menu-9");
        assert_eq!(row.item.quantity, 1);
        assert!(matches!(row.parent, Some(ParentRecord::Tab(_))));
    }

    #[rstest]
    fn orphans_have_no_parent() {
        let row = SourcedLineItemBuilder::orphan("li-1").without_catalog().build();
        assert_eq!(row.parent, None);
        assert_eq!(row.catalog, None);
    }
}
