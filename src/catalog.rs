//! Catalog operations shared by the HTTP server and the CLI.
//!
//! Every mutation is applied to the database first. Only once it has
//! succeeded is the search index updated, and index trouble never changes the
//! outcome reported to the caller.

use serde::Serialize;
use std::sync::Arc;

use crate::config::{Config, SearchBackend};
use crate::db::{init_db, ItemRepository, StockDecrement, StoreError};
use crate::models::{Item, ItemInput};
use crate::search::{ElasticIndex, InMemoryIndex};
use crate::sync::{IndexSync, MatchMode, SearchOutcome};

/// Errors returned by catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The request itself is invalid.
    #[error("{0}")]
    Validation(String),
    #[error("Item {0} not found")]
    NotFound(i64),
    /// Duplicate key, or not enough stock to fulfil a decrement.
    #[error("{0}")]
    Conflict(String),
    /// The store acknowledged a write but the result could not be read back.
    #[error("{0}")]
    InternalInconsistency(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CatalogError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey(detail) => {
                CatalogError::Conflict(format!("Duplicate key: {}", detail))
            }
            e @ StoreError::InvalidQuantity(_) => CatalogError::Validation(e.to_string()),
            other => CatalogError::Store(other),
        }
    }
}

/// Counts from both stores, for spotting drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub enabled: bool,
    pub match_mode: MatchMode,
    pub store_count: i64,
    pub index_count: u64,
}

#[derive(Clone)]
pub struct Catalog {
    repo: ItemRepository,
    sync: IndexSync,
}

impl Catalog {
    pub fn new(repo: ItemRepository, sync: IndexSync) -> Self {
        Self { repo, sync }
    }

    /// Opens the database and connects the configured search backend.
    ///
    /// An unreachable Elasticsearch is not fatal: the catalog starts anyway
    /// and index operations fail softly until it comes back.
    pub async fn open(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = init_db(&config.database_path).await?;
        let repo = ItemRepository::new(pool);
        let search = &config.search;

        let sync = if !search.enabled {
            tracing::info!("Search index sync disabled");
            IndexSync::disabled(repo.clone())
        } else {
            let sync = match search.backend {
                SearchBackend::Memory => {
                    IndexSync::new(repo.clone(), Arc::new(InMemoryIndex::new()))
                }
                SearchBackend::Elasticsearch => {
                    let index = ElasticIndex::new(
                        &search.url,
                        search.index.clone(),
                        std::time::Duration::from_secs(search.timeout_secs),
                        search.max_results,
                    )?;
                    if let Err(e) = index.ensure_index().await {
                        tracing::warn!(
                            "Could not prepare search index '{}' at {}: {}",
                            search.index,
                            search.url,
                            e
                        );
                    }
                    IndexSync::new(repo.clone(), Arc::new(index))
                }
            };
            sync.with_match_mode(search.match_mode)
        };

        Ok(Self::new(repo, sync))
    }

    /// Lists items from the database.
    ///
    /// A non-blank name filter takes precedence over the category filter.
    pub async fn list(
        &self,
        name: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<Item>, CatalogError> {
        let name = name.filter(|n| !n.trim().is_empty());
        let category = category.filter(|c| !c.trim().is_empty());

        let items = match (name, category) {
            (Some(name), _) => self.repo.find_by_name_contains(name).await?,
            (None, Some(category)) => self.repo.find_by_category(category).await?,
            (None, None) => self.repo.list().await?,
        };
        Ok(items)
    }

    pub async fn get(&self, id: i64) -> Result<Item, CatalogError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Creates an item. Any caller-supplied id is discarded.
    pub async fn create(&self, mut input: ItemInput) -> Result<Item, CatalogError> {
        input.id = None;
        input.stock = Some(validate_stock(input.stock_or_default())?);

        let item = self.repo.create(&input).await?;
        self.sync.index(Some(&item)).await;
        Ok(item)
    }

    /// Replaces name, category and stock of an existing item.
    pub async fn update(&self, id: i64, input: ItemInput) -> Result<Item, CatalogError> {
        let stock = validate_stock(input.stock_or_default())?;
        let existing = self.get(id).await?;

        let merged = ItemInput::new(input.name, input.category).with_stock(stock);
        let item = self
            .repo
            .update(existing.id, &merged)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        self.sync.index(Some(&item)).await;
        Ok(item)
    }

    /// Changes name and category of an existing item, keeping its stock.
    pub async fn update_details(
        &self,
        id: i64,
        name: &str,
        category: &str,
    ) -> Result<Item, CatalogError> {
        let item = self
            .repo
            .update_details(id, name, category)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        self.sync.index(Some(&item)).await;
        Ok(item)
    }

    pub async fn delete(&self, id: i64) -> Result<(), CatalogError> {
        if !self.repo.exists(id).await? {
            return Err(CatalogError::NotFound(id));
        }

        self.repo.delete(id).await?;
        self.sync.delete_by_id(Some(id)).await;
        Ok(())
    }

    /// Takes `qty` units out of stock, atomically.
    ///
    /// Returns the item as stored after the decrement.
    pub async fn decrement(&self, id: i64, qty: i64) -> Result<Item, CatalogError> {
        if qty <= 0 {
            return Err(CatalogError::Validation(
                "qty must be greater than 0".to_string(),
            ));
        }

        match self.repo.decrement_stock(id, qty).await? {
            StockDecrement::Applied => {}
            StockDecrement::NotFound => {
                return Err(CatalogError::Conflict(format!(
                    "Item {} does not exist",
                    id
                )))
            }
            StockDecrement::InsufficientStock => {
                return Err(CatalogError::Conflict(format!(
                    "Insufficient stock for item {}",
                    id
                )))
            }
        }

        let Some(item) = self.repo.get_by_id(id).await? else {
            tracing::error!("Item {} vanished right after a stock decrement", id);
            return Err(CatalogError::InternalInconsistency(format!(
                "Stock was decremented but item {} could not be read back",
                id
            )));
        };

        self.sync.index(Some(&item)).await;
        Ok(item)
    }

    /// Queries the search index; the database is not consulted.
    pub async fn search(&self, name: Option<&str>, category: Option<&str>) -> SearchOutcome {
        self.sync.search(name, category).await
    }

    /// Rebuilds the search index; returns the number of documents written.
    pub async fn reindex(&self) -> u64 {
        self.sync.reindex_all().await
    }

    pub async fn status(&self) -> Result<IndexStatus, CatalogError> {
        Ok(IndexStatus {
            enabled: self.sync.is_enabled(),
            match_mode: self.sync.match_mode(),
            store_count: self.repo.count().await?,
            index_count: self.sync.index_count().await,
        })
    }
}

fn validate_stock(stock: i64) -> Result<i64, CatalogError> {
    if stock < 0 {
        return Err(CatalogError::Validation(format!(
            "stock must not be negative, got {}",
            stock
        )));
    }
    Ok(stock)
}
