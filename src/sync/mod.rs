//! Keeps the search index in step with the primary store.
//!
//! Writes go to SQLite first and are then pushed to the search index on a
//! best-effort basis: an index failure is logged and swallowed, never rolled
//! back into the caller's result. Because individual pushes can be lost or
//! land out of order, [`IndexSync::reindex_all`] rebuilds the whole index from
//! the store and is the way to repair drift.

mod index_sync;
mod match_mode;

pub use index_sync::{IndexSync, SearchOutcome};
pub use match_mode::MatchMode;
