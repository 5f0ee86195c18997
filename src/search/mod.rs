//! Secondary search index adapters.
//!
//! The search index holds denormalized [`IndexedItem`] documents and is never
//! authoritative: every operation may fail, and callers treat a failure as
//! "the operation did not happen".
//!
//! Two backends are provided:
//! - [`ElasticIndex`]: Elasticsearch over its REST API
//! - [`InMemoryIndex`]: process-local, for development and tests

mod elastic;
mod memory;

pub use elastic::ElasticIndex;
pub use memory::InMemoryIndex;

use async_trait::async_trait;

use crate::models::IndexedItem;

/// Errors reported by a search index backend.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Transport-level failure (connection refused, timeout, ...).
    #[error("Search index request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("Search index returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// A bulk request was accepted but some documents were rejected.
    #[error("Bulk indexing rejected {0} document(s)")]
    BulkRejected(usize),
    /// Request or response body could not be (de)serialized.
    #[error("Search index payload error: {0}")]
    Payload(#[from] serde_json::Error),
    /// The backend is offline.
    #[error("Search index unavailable: {0}")]
    Unavailable(String),
}

/// Document store with containment queries over indexed items.
///
/// Name containment is a case-insensitive substring match; category lookup is
/// an exact term match.
///
/// Backends may bound how many documents a single query returns. The
/// Elasticsearch backend returns at most `search.max_results` hits from every
/// finder and from [`SearchIndex::list_all`]; raise that setting if the
/// catalog outgrows it. [`SearchIndex::count`] is never capped.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Short backend name used in log lines.
    fn backend(&self) -> &'static str;

    async fn upsert(&self, doc: &IndexedItem) -> Result<(), IndexError>;

    /// Deleting an id that is not indexed succeeds.
    async fn delete_by_id(&self, id: &str) -> Result<(), IndexError>;

    async fn delete_all(&self) -> Result<(), IndexError>;

    async fn bulk_upsert(&self, docs: &[IndexedItem]) -> Result<(), IndexError>;

    async fn count(&self) -> Result<u64, IndexError>;

    async fn find_by_name_contains(&self, name: &str) -> Result<Vec<IndexedItem>, IndexError>;

    async fn find_by_category(&self, category: &str) -> Result<Vec<IndexedItem>, IndexError>;

    /// Documents whose name contains `name` or whose category contains `category`.
    async fn find_by_name_or_category_contains(
        &self,
        name: &str,
        category: &str,
    ) -> Result<Vec<IndexedItem>, IndexError>;

    /// Documents whose name contains `name` and whose category contains `category`.
    async fn find_by_name_and_category_contains(
        &self,
        name: &str,
        category: &str,
    ) -> Result<Vec<IndexedItem>, IndexError>;

    /// Every indexed document, up to the backend's result cap.
    async fn list_all(&self) -> Result<Vec<IndexedItem>, IndexError>;
}
