use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogEntryKind {
    #[default]
    Prepared,
    /// Sold as-is from inventory. Displays the inventory item's name.
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub preparation_time_minutes: Option<u32>,
    #[serde(default)]
    pub kind: CatalogEntryKind,
    #[serde(default)]
    pub inventory_item_id: Option<String>,
}

impl CatalogEntry {
    /// Joins the entry for a line item, applying the inventory name override for direct entries.
    pub fn resolve(&self, inventory_name: Option<&str>) -> CatalogRef {
        let display_name = match (self.kind, inventory_name) {
            (CatalogEntryKind::Direct, Some(name)) if !name.trim().is_empty() => name.to_string(),
            _ => self.display_name.clone(),
        };
        CatalogRef {
            id: self.id.clone(),
            display_name: Some(display_name),
            category: self.category.clone(),
            preparation_time_minutes: self.preparation_time_minutes,
        }
    }
}

/// Catalog columns as they come back from the join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRef {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub preparation_time_minutes: Option<u32>,
}

impl CatalogRef {
    pub fn name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Label shown when a line item's catalog entry cannot be resolved.
pub fn placeholder_name(menu_item_id: &str) -> String {
    let chars: Vec<char> = menu_item_id.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    if tail.is_empty() {
        "Item ?".to_string()
    } else {
        format!("Item {tail}")
    }
}
