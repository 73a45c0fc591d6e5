//! Multi-source game catalog aggregation.
//!
//! This crate implements the **business logic** for building one unified
//! game listing out of N independent remote catalog providers plus the local
//! installed-game enumeration. It is a library crate with no network or
//! storage dependencies — callers provide [`CatalogSource`] and
//! [`LibraryStore`] implementations that bridge to the actual clients.
//!
//! # Guarantees
//!
//! - Sources are fetched concurrently with isolated failure domains: a
//!   failing source contributes an empty list, never an error.
//! - Entries are deduplicated by id across sources; the first occurrence
//!   wins, later duplicates are dropped (not merged).
//! - Enrichment (installed/downloading/progress) is a separate pass that
//!   degrades to the raw merge when the library store fails.

pub mod aggregator;
pub mod source;
pub mod types;

pub use aggregator::{CatalogAggregator, DEFAULT_CACHE_TTL};
pub use source::{CatalogSource, LibraryStore};
pub use types::{CatalogEntry, format_size};

/// Errors produced by catalog collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("library error: {0}")]
    Library(String),
}
