//! Process-local search index.
//!
//! Keeps documents in a map behind an async lock. Nothing is persisted, so a
//! restart starts empty until the next reindex.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{IndexError, SearchIndex};
use crate::models::IndexedItem;

#[derive(Debug, Default)]
pub struct InMemoryIndex {
    docs: RwLock<BTreeMap<String, IndexedItem>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filter<F>(&self, predicate: F) -> Vec<IndexedItem>
    where
        F: Fn(&IndexedItem) -> bool,
    {
        let docs = self.docs.read().await;
        docs.values().filter(|d| predicate(d)).cloned().collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, doc: &IndexedItem) -> Result<(), IndexError> {
        self.docs.write().await.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), IndexError> {
        self.docs.write().await.remove(id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), IndexError> {
        self.docs.write().await.clear();
        Ok(())
    }

    async fn bulk_upsert(&self, docs: &[IndexedItem]) -> Result<(), IndexError> {
        let mut map = self.docs.write().await;
        for doc in docs {
            map.insert(doc.id.clone(), doc.clone());
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, IndexError> {
        Ok(self.docs.read().await.len() as u64)
    }

    async fn find_by_name_contains(&self, name: &str) -> Result<Vec<IndexedItem>, IndexError> {
        Ok(self.filter(|d| contains_ignore_case(&d.name, name)).await)
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<IndexedItem>, IndexError> {
        Ok(self.filter(|d| d.category == category).await)
    }

    async fn find_by_name_or_category_contains(
        &self,
        name: &str,
        category: &str,
    ) -> Result<Vec<IndexedItem>, IndexError> {
        Ok(self
            .filter(|d| {
                contains_ignore_case(&d.name, name) || contains_ignore_case(&d.category, category)
            })
            .await)
    }

    async fn find_by_name_and_category_contains(
        &self,
        name: &str,
        category: &str,
    ) -> Result<Vec<IndexedItem>, IndexError> {
        Ok(self
            .filter(|d| {
                contains_ignore_case(&d.name, name) && contains_ignore_case(&d.category, category)
            })
            .await)
    }

    async fn list_all(&self) -> Result<Vec<IndexedItem>, IndexError> {
        Ok(self.docs.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, name: &str, category: &str, stock: i64) -> IndexedItem {
        IndexedItem {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            stock,
        }
    }

    async fn seeded() -> InMemoryIndex {
        let index = InMemoryIndex::new();
        index
            .bulk_upsert(&[
                doc("1", "Star", "Bronze", 5),
                doc("2", "Superstar", "Gold", 1),
                doc("3", "Moon", "Silver", 0),
            ])
            .await
            .unwrap();
        index
    }

    fn ids(docs: &[IndexedItem]) -> Vec<&str> {
        let mut ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let index = InMemoryIndex::new();
        index.upsert(&doc("1", "Star", "Bronze", 5)).await.unwrap();
        index.upsert(&doc("1", "Star", "Bronze", 2)).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        assert_eq!(index.list_all().await.unwrap()[0].stock, 2);
    }

    #[tokio::test]
    async fn test_delete_by_id_missing_is_ok() {
        let index = seeded().await;
        index.delete_by_id("42").await.unwrap();
        index.delete_by_id("1").await.unwrap();
        assert_eq!(index.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_all() {
        let index = seeded().await;
        index.delete_all().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_name_contains_ignores_case() {
        let index = seeded().await;
        let found = index.find_by_name_contains("STAR").await.unwrap();
        assert_eq!(ids(&found), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_category_is_exact() {
        let index = seeded().await;
        assert_eq!(ids(&index.find_by_category("Gold").await.unwrap()), vec!["2"]);
        assert!(index.find_by_category("gold").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_name_or_category() {
        let index = seeded().await;
        let found = index
            .find_by_name_or_category_contains("moon", "gold")
            .await
            .unwrap();
        assert_eq!(ids(&found), vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_name_and_category() {
        let index = seeded().await;
        let found = index
            .find_by_name_and_category_contains("star", "bron")
            .await
            .unwrap();
        assert_eq!(ids(&found), vec!["1"]);
    }
}
