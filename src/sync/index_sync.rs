use std::sync::Arc;

use super::MatchMode;
use crate::db::{ItemRepository, StoreError};
use crate::models::{IndexedItem, Item};
use crate::search::{IndexError, SearchIndex};

/// Result of a search against the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Index synchronization is turned off; no lookup was made.
    Disabled,
    /// Documents returned by the index. Empty if nothing matched or the
    /// index could not be reached.
    Results(Vec<IndexedItem>),
}

impl SearchOutcome {
    pub fn is_disabled(&self) -> bool {
        matches!(self, SearchOutcome::Disabled)
    }

    pub fn into_results(self) -> Vec<IndexedItem> {
        match self {
            SearchOutcome::Disabled => Vec::new(),
            SearchOutcome::Results(docs) => docs,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ReindexError {
    #[error("reading items: {0}")]
    Store(#[from] StoreError),
    #[error("writing index: {0}")]
    Index(#[from] IndexError),
}

/// Best-effort propagation of item state from the store to the search index.
///
/// When constructed with [`IndexSync::disabled`] every operation is a no-op.
#[derive(Clone)]
pub struct IndexSync {
    repo: ItemRepository,
    index: Option<Arc<dyn SearchIndex>>,
    match_mode: MatchMode,
}

impl IndexSync {
    pub fn new(repo: ItemRepository, index: Arc<dyn SearchIndex>) -> Self {
        Self {
            repo,
            index: Some(index),
            match_mode: MatchMode::default(),
        }
    }

    pub fn disabled(repo: ItemRepository) -> Self {
        Self {
            repo,
            index: None,
            match_mode: MatchMode::default(),
        }
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.index.is_some()
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Pushes the item's current state to the index. Failures are logged only.
    pub async fn index(&self, item: Option<&Item>) {
        let (Some(index), Some(item)) = (&self.index, item) else {
            return;
        };

        if let Err(e) = index.upsert(&IndexedItem::from(item)).await {
            tracing::warn!(
                "Failed to index item {} in {}: {}",
                item.id,
                index.backend(),
                e
            );
        }
    }

    /// Removes the item's document from the index. Failures are logged only.
    pub async fn delete_by_id(&self, id: Option<i64>) {
        let (Some(index), Some(id)) = (&self.index, id) else {
            return;
        };

        if let Err(e) = index.delete_by_id(&id.to_string()).await {
            tracing::warn!(
                "Failed to remove item {} from {}: {}",
                id,
                index.backend(),
                e
            );
        }
    }

    /// Rebuilds the index from every item in the store.
    ///
    /// The index is cleared before being repopulated so documents of deleted
    /// items cannot survive; searches see an empty index in between. Returns
    /// the number of documents written, or 0 if disabled or if any step
    /// failed.
    pub async fn reindex_all(&self) -> u64 {
        let Some(index) = &self.index else {
            return 0;
        };

        match self.rebuild(index.as_ref()).await {
            Ok(count) => {
                tracing::info!("Reindexed {} item(s) into {}", count, index.backend());
                count
            }
            Err(e) => {
                tracing::warn!("Reindex into {} aborted: {}", index.backend(), e);
                0
            }
        }
    }

    async fn rebuild(&self, index: &dyn SearchIndex) -> Result<u64, ReindexError> {
        let docs: Vec<IndexedItem> = self
            .repo
            .list()
            .await?
            .iter()
            .map(IndexedItem::from)
            .collect();

        index.delete_all().await?;
        index.bulk_upsert(&docs).await?;

        Ok(docs.len() as u64)
    }

    /// Searches the index by name and/or category.
    ///
    /// Blank filters are ignored. With both filters present the configured
    /// [`MatchMode`] decides how they combine; with neither, the whole index
    /// is returned.
    pub async fn search(&self, name: Option<&str>, category: Option<&str>) -> SearchOutcome {
        let Some(index) = &self.index else {
            return SearchOutcome::Disabled;
        };

        let name = name.filter(|n| !n.trim().is_empty());
        let category = category.filter(|c| !c.trim().is_empty());

        let result = match (name, category) {
            (Some(name), Some(category)) => match self.match_mode {
                MatchMode::Any => index.find_by_name_or_category_contains(name, category).await,
                MatchMode::All => index.find_by_name_and_category_contains(name, category).await,
            },
            (Some(name), None) => index.find_by_name_contains(name).await,
            (None, Some(category)) => index.find_by_category(category).await,
            (None, None) => index.list_all().await,
        };

        match result {
            Ok(docs) => SearchOutcome::Results(docs),
            Err(e) => {
                tracing::warn!("Search against {} failed: {}", index.backend(), e);
                SearchOutcome::Results(Vec::new())
            }
        }
    }

    /// Number of documents in the index; 0 when disabled or unreachable.
    pub async fn index_count(&self) -> u64 {
        let Some(index) = &self.index else {
            return 0;
        };

        match index.count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Counting documents in {} failed: {}", index.backend(), e);
                0
            }
        }
    }
}
