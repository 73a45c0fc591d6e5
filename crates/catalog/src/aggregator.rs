//! Catalog aggregator — unified listing across sources plus installed games.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::source::{CatalogSource, LibraryStore};
use crate::types::CatalogEntry;

/// Default provider-cache window handed down on every fetch.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(45);

/// Merges game listings from every configured source into one deduplicated,
/// enriched sequence.
pub struct CatalogAggregator {
    sources: Vec<Arc<dyn CatalogSource>>,
    library: Arc<dyn LibraryStore>,
    cache_ttl: Duration,
}

impl CatalogAggregator {
    /// Creates an aggregator over the given sources and library store.
    pub fn new(sources: Vec<Arc<dyn CatalogSource>>, library: Arc<dyn LibraryStore>) -> Self {
        Self {
            sources,
            library,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Overrides the provider-cache TTL policy.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Returns the unified game listing.
    ///
    /// Authenticated sources are fetched concurrently; a failing source
    /// contributes nothing. Remote entries are merged first-wins by id, then
    /// installed games are appended (skipping ids already seen), then the
    /// whole set goes through the enrichment pass.
    pub async fn list_all(&self) -> Vec<CatalogEntry> {
        let fetches = self
            .sources
            .iter()
            .map(|source| self.fetch_guarded(source.as_ref(), false));
        let results = join_all(fetches).await;

        let mut seen: HashSet<String> = HashSet::new();
        let mut games: Vec<CatalogEntry> = Vec::new();
        for entries in results {
            merge_first_wins(&mut games, &mut seen, entries);
        }

        match self.library.installed_games().await {
            Ok(installed) => merge_first_wins(&mut games, &mut seen, installed),
            Err(e) => warn!(error = %e, "failed to enumerate installed games"),
        }

        self.enrich_or_raw(games).await
    }

    /// Returns one source's listing, optionally bypassing its cache.
    ///
    /// An unknown label or an unauthenticated source yields an empty list.
    pub async fn list_source(&self, label: &str, force_refresh: bool) -> Vec<CatalogEntry> {
        let Some(source) = self.sources.iter().find(|s| s.label() == label) else {
            warn!(label, "unknown catalog source");
            return Vec::new();
        };

        let entries = self.fetch_guarded(source.as_ref(), force_refresh).await;
        if entries.is_empty() {
            return entries;
        }
        self.enrich_or_raw(entries).await
    }

    /// Searches every authenticated source, merged first-wins by id.
    pub async fn search(&self, query: &str, category: &str) -> Vec<CatalogEntry> {
        let searches = self
            .sources
            .iter()
            .map(|source| self.search_guarded(source.as_ref(), query, category));
        let results = join_all(searches).await;

        let mut seen: HashSet<String> = HashSet::new();
        let mut games: Vec<CatalogEntry> = Vec::new();
        for entries in results {
            merge_first_wins(&mut games, &mut seen, entries);
        }
        games
    }

    /// Fetches one source with its failure domain isolated.
    async fn fetch_guarded(&self, source: &dyn CatalogSource, force_refresh: bool) -> Vec<CatalogEntry> {
        if !self.authenticated(source).await {
            return Vec::new();
        }

        match source.fetch(force_refresh, self.cache_ttl).await {
            Ok(entries) => {
                debug!(source = source.label(), count = entries.len(), "source fetched");
                entries
            }
            Err(e) => {
                warn!(source = source.label(), error = %e, "failed to load source games");
                Vec::new()
            }
        }
    }

    async fn search_guarded(
        &self,
        source: &dyn CatalogSource,
        query: &str,
        category: &str,
    ) -> Vec<CatalogEntry> {
        if !self.authenticated(source).await {
            return Vec::new();
        }

        match source.search(query, category).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(source = source.label(), error = %e, "search failed");
                Vec::new()
            }
        }
    }

    async fn authenticated(&self, source: &dyn CatalogSource) -> bool {
        match source.is_authenticated().await {
            Ok(authenticated) => authenticated,
            Err(e) => {
                warn!(source = source.label(), error = %e, "failed to query login state");
                false
            }
        }
    }

    /// Runs the enrichment pass, degrading to the raw merge on failure.
    async fn enrich_or_raw(&self, games: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
        match self.library.enrich(games.clone()).await {
            Ok(enriched) => {
                self.library.update_cache(&enriched).await;
                enriched
            }
            Err(e) => {
                warn!(error = %e, "enrichment failed, returning raw listing");
                games
            }
        }
    }
}

/// Appends entries whose ids were not seen before. First occurrence wins.
fn merge_first_wins(
    games: &mut Vec<CatalogEntry>,
    seen: &mut HashSet<String>,
    entries: Vec<CatalogEntry>,
) {
    for entry in entries {
        if entry.id.is_empty() || !seen.insert(entry.id.clone()) {
            continue;
        }
        games.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CatalogError;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    /// Mock source with canned entries and failure switches.
    struct MockSource {
        label: String,
        authenticated: bool,
        auth_fails: bool,
        fetch_fails: bool,
        entries: Vec<CatalogEntry>,
        search_results: Vec<CatalogEntry>,
        fetch_calls: Mutex<Vec<bool>>,
    }

    impl MockSource {
        fn new(label: &str, entries: Vec<CatalogEntry>) -> Self {
            Self {
                label: label.into(),
                authenticated: true,
                auth_fails: false,
                fetch_fails: false,
                entries,
                search_results: Vec::new(),
                fetch_calls: Mutex::new(Vec::new()),
            }
        }

        fn logged_out(mut self) -> Self {
            self.authenticated = false;
            self
        }

        fn failing(mut self) -> Self {
            self.fetch_fails = true;
            self
        }
    }

    impl CatalogSource for MockSource {
        fn label(&self) -> &str {
            &self.label
        }

        fn is_authenticated(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<bool, CatalogError>> + Send + '_>> {
            Box::pin(async move {
                if self.auth_fails {
                    Err(CatalogError::Provider("session check failed".into()))
                } else {
                    Ok(self.authenticated)
                }
            })
        }

        fn fetch(
            &self,
            force_refresh: bool,
            _ttl: Duration,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<CatalogEntry>, CatalogError>> + Send + '_>>
        {
            self.fetch_calls.lock().unwrap().push(force_refresh);
            Box::pin(async move {
                if self.fetch_fails {
                    Err(CatalogError::Provider("boom".into()))
                } else {
                    Ok(self.entries.clone())
                }
            })
        }

        fn search(
            &self,
            _query: &str,
            _category: &str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<CatalogEntry>, CatalogError>> + Send + '_>>
        {
            Box::pin(async move { Ok(self.search_results.clone()) })
        }

        fn download_urls(
            &self,
            _game_id: &str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<serde_json::Value>, CatalogError>> + Send + '_>>
        {
            Box::pin(async move { Ok(Vec::new()) })
        }

        fn cleanup(&self) -> Pin<Box<dyn Future<Output = Result<(), CatalogError>> + Send + '_>> {
            Box::pin(async move { Ok(()) })
        }
    }

    /// Mock library store that marks entries installed on enrichment.
    struct MockLibrary {
        installed: Vec<CatalogEntry>,
        enrich_fails: bool,
        cached: Mutex<Vec<CatalogEntry>>,
    }

    impl MockLibrary {
        fn empty() -> Self {
            Self {
                installed: Vec::new(),
                enrich_fails: false,
                cached: Mutex::new(Vec::new()),
            }
        }

        fn with_installed(installed: Vec<CatalogEntry>) -> Self {
            Self {
                installed,
                ..Self::empty()
            }
        }

        fn enrich_failing() -> Self {
            Self {
                enrich_fails: true,
                ..Self::empty()
            }
        }
    }

    impl LibraryStore for MockLibrary {
        fn installed_games(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<CatalogEntry>, CatalogError>> + Send + '_>>
        {
            Box::pin(async move { Ok(self.installed.clone()) })
        }

        fn enrich(
            &self,
            entries: Vec<CatalogEntry>,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<CatalogEntry>, CatalogError>> + Send + '_>>
        {
            Box::pin(async move {
                if self.enrich_fails {
                    return Err(CatalogError::Library("enrich failed".into()));
                }
                Ok(entries
                    .into_iter()
                    .map(|mut e| {
                        e.downloading = true;
                        e
                    })
                    .collect())
            })
        }

        fn update_cache(
            &self,
            entries: &[CatalogEntry],
        ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
            let entries = entries.to_vec();
            Box::pin(async move {
                *self.cached.lock().unwrap() = entries;
            })
        }

        fn cached_info(
            &self,
            game_id: &str,
        ) -> Pin<Box<dyn Future<Output = Option<CatalogEntry>> + Send + '_>> {
            let game_id = game_id.to_string();
            Box::pin(async move {
                self.cached
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|e| e.id == game_id)
                    .cloned()
            })
        }
    }

    fn entry(id: &str, platform: &str) -> CatalogEntry {
        CatalogEntry::new(id, format!("Game {id}"), platform)
    }

    fn aggregator(
        sources: Vec<MockSource>,
        library: MockLibrary,
    ) -> CatalogAggregator {
        let sources: Vec<Arc<dyn CatalogSource>> = sources
            .into_iter()
            .map(|s| Arc::new(s) as Arc<dyn CatalogSource>)
            .collect();
        CatalogAggregator::new(sources, Arc::new(library))
    }

    #[tokio::test]
    async fn empty_world_yields_empty_list() {
        let agg = aggregator(
            vec![MockSource::new("hikari", vec![]).logged_out()],
            MockLibrary::empty(),
        );
        assert!(agg.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_first_source_wins() {
        let agg = aggregator(
            vec![
                MockSource::new("hikari", vec![entry("g1", "hikari")]),
                MockSource::new("dlsite", vec![entry("g1", "dlsite"), entry("g2", "dlsite")]),
            ],
            MockLibrary::empty(),
        );

        let games = agg.list_all().await;
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].id, "g1");
        assert_eq!(games[0].platform, "hikari");
        assert_eq!(games[1].id, "g2");
    }

    #[tokio::test]
    async fn unauthenticated_source_contributes_nothing() {
        let agg = aggregator(
            vec![
                MockSource::new("hikari", vec![entry("g1", "hikari")]).logged_out(),
                MockSource::new("dlsite", vec![entry("g2", "dlsite")]),
            ],
            MockLibrary::empty(),
        );

        let games = agg.list_all().await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, "g2");
    }

    #[tokio::test]
    async fn failing_source_does_not_block_others() {
        let agg = aggregator(
            vec![
                MockSource::new("hikari", vec![]).failing(),
                MockSource::new("dlsite", vec![entry("g2", "dlsite")]),
            ],
            MockLibrary::empty(),
        );

        let games = agg.list_all().await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, "g2");
    }

    #[tokio::test]
    async fn auth_check_error_treated_as_logged_out() {
        let mut failing = MockSource::new("hikari", vec![entry("g1", "hikari")]);
        failing.auth_fails = true;

        let agg = aggregator(
            vec![failing, MockSource::new("dlsite", vec![entry("g2", "dlsite")])],
            MockLibrary::empty(),
        );

        let games = agg.list_all().await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, "g2");
    }

    #[tokio::test]
    async fn installed_games_appended_after_sources() {
        let mut installed = entry("g9", "local");
        installed.installed = true;
        // Also installed locally, but the remote listing already has it.
        let mut dup = entry("g1", "local");
        dup.installed = true;

        let agg = aggregator(
            vec![MockSource::new("hikari", vec![entry("g1", "hikari")])],
            MockLibrary::with_installed(vec![dup, installed]),
        );

        let games = agg.list_all().await;
        let ids: Vec<&str> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g9"]);
        assert_eq!(games[0].platform, "hikari");
    }

    #[tokio::test]
    async fn enrichment_applied_and_cached() {
        let agg = aggregator(
            vec![MockSource::new("hikari", vec![entry("g1", "hikari")])],
            MockLibrary::empty(),
        );

        let games = agg.list_all().await;
        assert!(games[0].downloading, "enrichment pass must run");

        let cached = agg.library.cached_info("g1").await;
        assert!(cached.is_some(), "enriched listing must be cached");
    }

    #[tokio::test]
    async fn enrichment_failure_degrades_to_raw_merge() {
        let agg = aggregator(
            vec![MockSource::new("hikari", vec![entry("g1", "hikari")])],
            MockLibrary::enrich_failing(),
        );

        let games = agg.list_all().await;
        assert_eq!(games.len(), 1);
        assert!(!games[0].downloading);
    }

    #[tokio::test]
    async fn list_all_is_idempotent() {
        let agg = aggregator(
            vec![
                MockSource::new("hikari", vec![entry("g1", "hikari"), entry("g3", "hikari")]),
                MockSource::new("dlsite", vec![entry("g2", "dlsite")]),
            ],
            MockLibrary::empty(),
        );

        let first: Vec<String> = agg.list_all().await.into_iter().map(|g| g.id).collect();
        let second: Vec<String> = agg.list_all().await.into_iter().map(|g| g.id).collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn list_source_passes_force_refresh_down() {
        let source = Arc::new(MockSource::new("dlsite", vec![entry("g1", "dlsite")]));
        let agg = CatalogAggregator::new(
            vec![source.clone() as Arc<dyn CatalogSource>],
            Arc::new(MockLibrary::empty()),
        );

        let games = agg.list_source("dlsite", true).await;
        assert_eq!(games.len(), 1);
        assert_eq!(*source.fetch_calls.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn list_source_unknown_label_is_empty() {
        let agg = aggregator(
            vec![MockSource::new("dlsite", vec![entry("g1", "dlsite")])],
            MockLibrary::empty(),
        );
        assert!(agg.list_source("steam", false).await.is_empty());
    }

    #[tokio::test]
    async fn search_merges_across_sources() {
        let mut a = MockSource::new("hikari", vec![]);
        a.search_results = vec![entry("g1", "hikari")];
        let mut b = MockSource::new("dlsite", vec![]);
        b.search_results = vec![entry("g1", "dlsite"), entry("g2", "dlsite")];

        let agg = aggregator(vec![a, b], MockLibrary::empty());
        let games = agg.search("quartett", "all").await;

        let ids: Vec<&str> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2"]);
        assert_eq!(games[0].platform, "hikari");
    }
}
