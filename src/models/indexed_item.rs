use serde::{Deserialize, Serialize};

use super::Item;

/// Denormalized copy of an [`Item`] as held by the search index.
///
/// The id is kept in its textual form since document stores key on strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexedItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub stock: i64,
}

impl From<&Item> for IndexedItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            category: item.category.clone(),
            stock: item.stock,
        }
    }
}
