use serde::{Deserialize, Serialize};
use std::fmt;

/// A catalog item as stored in the primary database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub stock: i64,
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} [{}] stock: {}",
            self.id, self.name, self.category, self.stock
        )
    }
}

/// Fields accepted from callers when creating or updating an item.
///
/// `id` is accepted so that payloads echoing a previous response parse, but it
/// is never written: the store always assigns identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub stock: Option<i64>,
}

impl ItemInput {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            category: category.into(),
            stock: None,
        }
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = Some(stock);
        self
    }

    #[cfg(test)]
    pub(crate) fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Stock to persist: missing means zero.
    pub fn stock_or_default(&self) -> i64 {
        self.stock.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_without_stock_defaults_to_zero() {
        let input: ItemInput =
            serde_json::from_str(r#"{"name": "Star", "category": "Bronze"}"#).unwrap();
        assert_eq!(input.stock, None);
        assert_eq!(input.stock_or_default(), 0);
        assert_eq!(input.id, None);
    }

    #[test]
    fn test_input_accepts_id() {
        let input: ItemInput =
            serde_json::from_str(r#"{"id": 7, "name": "Star", "category": "Bronze", "stock": 3}"#)
                .unwrap();
        assert_eq!(input.id, Some(7));
        assert_eq!(input.stock_or_default(), 3);
    }

    #[test]
    fn test_item_display() {
        let item = Item {
            id: 1,
            name: "Star".to_string(),
            category: "Bronze".to_string(),
            stock: 5,
        };
        assert_eq!(item.to_string(), "#1 Star [Bronze] stock: 5");
    }
}
