//! Collaborator traits for catalog aggregation.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::CatalogError;
use crate::types::CatalogEntry;

/// Abstract remote catalog provider.
///
/// Implemented by the per-provider network clients; the aggregator only
/// talks to this trait. Providers own their session state and their listing
/// cache — the aggregator passes its TTL policy down on every fetch.
pub trait CatalogSource: Send + Sync {
    /// Short provider tag, e.g. `"hikari"` or `"dlsite"`.
    fn label(&self) -> &str;

    /// Whether the current session is authenticated with the provider.
    fn is_authenticated(&self) -> Pin<Box<dyn Future<Output = Result<bool, CatalogError>> + Send + '_>>;

    /// Fetches the caller's library, already translated to [`CatalogEntry`].
    ///
    /// `ttl` is the aggregator's cache policy, enforced by the provider's own
    /// cache; `force_refresh` bypasses it.
    fn fetch(
        &self,
        force_refresh: bool,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CatalogEntry>, CatalogError>> + Send + '_>>;

    /// Searches the provider's storefront.
    fn search(
        &self,
        query: &str,
        category: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CatalogEntry>, CatalogError>> + Send + '_>>;

    /// Resolves download URLs for a game.
    ///
    /// The payload stays raw JSON because providers disagree on its shape;
    /// the download coordinator filters out non-string entries.
    fn download_urls(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<serde_json::Value>, CatalogError>> + Send + '_>>;

    /// Releases provider resources on shutdown.
    fn cleanup(&self) -> Pin<Box<dyn Future<Output = Result<(), CatalogError>> + Send + '_>>;
}

/// Abstract local library store.
///
/// Supplies the installed-game enumeration and the enrichment pass that
/// stamps locally known state onto raw provider entries.
pub trait LibraryStore: Send + Sync {
    /// Enumerates installed games as fully-shaped entries
    /// (`installed = true`, `progress = 100`).
    fn installed_games(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CatalogEntry>, CatalogError>> + Send + '_>>;

    /// Fills `installed`/`downloading`/`progress` on the given entries.
    fn enrich(
        &self,
        entries: Vec<CatalogEntry>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CatalogEntry>, CatalogError>> + Send + '_>>;

    /// Caches an enriched listing for later point lookups.
    fn update_cache(
        &self,
        entries: &[CatalogEntry],
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Returns the cached entry for a game, if the library has seen it.
    fn cached_info(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Option<CatalogEntry>> + Send + '_>>;
}
