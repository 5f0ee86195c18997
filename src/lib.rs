//! Badge catalog backed by SQLite with a best-effort search index mirror.
//!
//! The database is the source of truth. Every successful write is mirrored
//! into a [`search::SearchIndex`] by [`sync::IndexSync`]; index failures are
//! logged and never surface to callers. [`catalog::Catalog`] is the entry
//! point used by both the HTTP server and the CLI.

pub mod catalog;
pub mod config;
pub mod db;
pub mod models;
pub mod search;
pub mod server;
pub mod sync;

pub use catalog::{Catalog, CatalogError, IndexStatus};
pub use config::Config;
pub use models::{IndexedItem, Item, ItemInput};
