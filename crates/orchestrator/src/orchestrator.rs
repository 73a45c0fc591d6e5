//! The orchestrator: collaborator wiring and the public request surface.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use vndeck_catalog::{CatalogAggregator, CatalogEntry, CatalogSource, LibraryStore};
use vndeck_downloads::{
    DownloadCoordinator, DownloadEngine, DownloadProgressRecord, OpResult, RawEngineStatus,
};
use vndeck_settings::{Preferences, SettingsBlob, SettingsStore, load_default_preferences};
use vndeck_steam_link::{
    AddGameResult, MetadataStore, OpOutcome, SteamIntegration, SteamMetadataBinder,
};

use crate::OrchestratorError;
use crate::host::HostPaths;
use crate::library_ops::LibraryOps;
use crate::session::ProviderSession;

/// How long a collaborator gets to finish cleanup before it is abandoned.
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Sort keys the library collaborator understands; anything else folds to
/// sorting by name.
const SORT_KEYS: [&str; 6] = [
    "name",
    "size",
    "install_date",
    "last_played",
    "rating",
    "developer",
];

/// Collaborator clients constructed by the host runtime.
pub struct Collaborators {
    pub session: Arc<dyn ProviderSession>,
    pub sources: Vec<Arc<dyn CatalogSource>>,
    pub library: Arc<dyn LibraryStore>,
    pub library_ops: Arc<dyn LibraryOps>,
    pub engine: Arc<dyn DownloadEngine>,
    pub steam: Arc<dyn SteamIntegration>,
    pub metadata: Arc<dyn MetadataStore>,
}

/// Lightweight health probe payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    pub running: bool,
    pub started_at: f64,
    pub uptime_seconds: f64,
}

/// Owns the process-wide mutable state (preferences, session re-export) and
/// routes every user-facing request to the right collaborator.
pub struct Orchestrator {
    started_at: Instant,
    started_at_epoch: f64,
    games_dir: PathBuf,
    settings: Arc<SettingsStore>,
    preferences: Arc<Mutex<Preferences>>,
    session: Arc<dyn ProviderSession>,
    sources: Vec<Arc<dyn CatalogSource>>,
    aggregator: CatalogAggregator,
    library: Arc<dyn LibraryStore>,
    library_ops: Arc<dyn LibraryOps>,
    downloads: DownloadCoordinator,
    steam: SteamMetadataBinder,
}

impl Orchestrator {
    /// Builds the orchestrator: creates runtime directories, loads the
    /// persisted settings and restores the provider session from them.
    pub async fn initialize(
        paths: HostPaths,
        collaborators: Collaborators,
    ) -> Result<Self, OrchestratorError> {
        info!("orchestrator starting");

        let games_dir = paths.games_dir();
        tokio::fs::create_dir_all(&games_dir).await?;
        tokio::fs::create_dir_all(paths.proton_dir()).await?;
        tokio::fs::create_dir_all(&paths.settings_dir).await?;

        let defaults = load_default_preferences(&paths.defaults_file());
        let settings = Arc::new(SettingsStore::new(paths.settings_file(), defaults));

        let blob = settings.load().await;
        if blob.hikari_token.is_some() || blob.current_server.is_some() {
            if let Err(e) = collaborators
                .session
                .import_state(blob.hikari_token.clone(), blob.current_server.clone())
                .await
            {
                warn!(error = %e, "failed to restore provider session");
            }
        }

        let aggregator = CatalogAggregator::new(
            collaborators.sources.clone(),
            collaborators.library.clone(),
        );
        let downloads = DownloadCoordinator::new(collaborators.engine.clone());
        let steam = SteamMetadataBinder::new(
            collaborators.steam,
            collaborators.metadata,
            games_dir.clone(),
        );

        info!("orchestrator started");
        Ok(Self {
            started_at: Instant::now(),
            started_at_epoch: Utc::now().timestamp_micros() as f64 / 1e6,
            games_dir,
            settings,
            preferences: Arc::new(Mutex::new(blob.preferences)),
            session: collaborators.session,
            sources: collaborators.sources,
            aggregator,
            library: collaborators.library,
            library_ops: collaborators.library_ops,
            downloads,
            steam,
        })
    }

    /// Orderly teardown: flush settings, then clean collaborators up with a
    /// fixed timeout each so an unresponsive client cannot hang shutdown.
    pub async fn shutdown(&self) {
        info!("orchestrator shutting down");

        let blob = self.snapshot_blob().await;
        if let Err(e) = self.settings.flush(&blob).await {
            error!(error = %e, "failed to flush settings on shutdown");
        }

        let mut cleanups: Vec<std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + '_>>> =
            Vec::new();
        for source in &self.sources {
            let name = source.label().to_string();
            cleanups.push(Box::pin(async move {
                cleanup_guarded(&name, async {
                    source.cleanup().await.map_err(|e| e.to_string())
                })
                .await;
            }));
        }
        cleanups.push(Box::pin(async {
            cleanup_guarded("download engine", async {
                self.downloads.cleanup().await.map_err(|e| e.to_string())
            })
            .await;
        }));
        join_all(cleanups).await;

        info!("orchestrator stopped");
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    /// Process uptime since initialization.
    pub fn backend_status(&self) -> BackendStatus {
        BackendStatus {
            running: true,
            started_at: self.started_at_epoch,
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
        }
    }

    // -----------------------------------------------------------------------
    // Preferences
    // -----------------------------------------------------------------------

    /// Current user preferences.
    pub async fn preferences(&self) -> Preferences {
        self.preferences.lock().await.clone()
    }

    /// Applies a raw preference update and schedules persistence.
    ///
    /// Unknown keys are dropped and type-mismatched values keep the current
    /// setting; a payload that is not an object changes nothing.
    pub async fn update_preferences(&self, updates: &Value) -> Preferences {
        if !updates.is_object() {
            return self.preferences.lock().await.clone();
        }

        let normalized = {
            let mut prefs = self.preferences.lock().await;
            *prefs = Preferences::normalize(Some(updates), &prefs);
            prefs.clone()
        };

        self.request_save();
        normalized
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    /// Unified game listing across all sources plus installed games.
    pub async fn list_games(&self) -> Vec<CatalogEntry> {
        self.aggregator.list_all().await
    }

    /// One source's listing, optionally bypassing its cache.
    pub async fn list_source_games(&self, label: &str, force_refresh: bool) -> Vec<CatalogEntry> {
        self.aggregator.list_source(label, force_refresh).await
    }

    /// Storefront search across authenticated sources.
    pub async fn search_games(&self, query: &str, category: &str) -> Vec<CatalogEntry> {
        self.aggregator.search(query, category).await
    }

    /// Unified listing filtered by the library collaborator's criteria.
    ///
    /// A filter failure degrades to the unfiltered listing.
    pub async fn filter_games(&self, filters: &Value) -> Vec<CatalogEntry> {
        let games = self.list_games().await;
        match self.library_ops.filter_games(games.clone(), filters).await {
            Ok(filtered) => filtered,
            Err(e) => {
                warn!(error = %e, "filtering failed, returning unfiltered listing");
                games
            }
        }
    }

    /// Unified listing sorted by `sort_by`; unknown keys sort by name.
    pub async fn sort_games(&self, sort_by: &str, reverse: bool) -> Vec<CatalogEntry> {
        let sort_by = if SORT_KEYS.contains(&sort_by) {
            sort_by
        } else {
            "name"
        };

        let games = self.list_games().await;
        match self.library_ops.sort_games(games.clone(), sort_by, reverse).await {
            Ok(sorted) => sorted,
            Err(e) => {
                warn!(error = %e, "sorting failed, returning unsorted listing");
                games
            }
        }
    }

    // -----------------------------------------------------------------------
    // Downloads
    // -----------------------------------------------------------------------

    /// Resolves URLs from the game's source and starts a download.
    pub async fn download_game(&self, source_label: &str, game_id: &str) -> OpResult {
        let Some(source) = self.sources.iter().find(|s| s.label() == source_label) else {
            return OpResult::fail(format!("Unknown source: {source_label}"));
        };

        let urls = match source.download_urls(game_id).await {
            Ok(urls) => urls,
            Err(e) => {
                error!(game_id, source = source_label, error = %e, "failed to get download URLs");
                return OpResult::fail("Failed to get download URLs");
            }
        };

        let cached = self.library.cached_info(game_id).await;
        let game_name = cached
            .as_ref()
            .map(|info| info.name.clone())
            .unwrap_or_else(|| format!("Game {game_id}"));
        let expected_size = cached
            .as_ref()
            .map(|info| info.expected_size)
            .filter(|size| *size > 0);

        let result = self
            .downloads
            .start(game_id, &game_name, &urls, expected_size, None)
            .await;
        if result.success {
            self.request_save();
        }
        result
    }

    pub async fn pause_download(&self, game_id: &str) -> OpResult {
        self.downloads.pause(game_id).await
    }

    pub async fn resume_download(&self, game_id: &str) -> OpResult {
        self.downloads.resume(game_id).await
    }

    pub async fn cancel_download(&self, game_id: &str) -> OpResult {
        let result = self.downloads.cancel(game_id).await;
        if result.success {
            self.request_save();
        }
        result
    }

    pub async fn switch_download_source(&self, game_id: &str, preferred_source: &str) -> OpResult {
        self.downloads.switch_source(game_id, preferred_source).await
    }

    /// Canonical progress record for one game.
    pub async fn download_progress(&self, game_id: &str) -> DownloadProgressRecord {
        self.downloads.status(game_id).await
    }

    /// Raw engine status with engine-specific detail, unnormalized.
    pub async fn download_progress_detailed(&self, game_id: &str) -> Option<RawEngineStatus> {
        self.downloads.detailed_status(game_id).await
    }

    /// Canonical progress for every active download.
    pub async fn active_downloads(&self) -> Vec<DownloadProgressRecord> {
        self.downloads.active_downloads().await
    }

    // -----------------------------------------------------------------------
    // Steam
    // -----------------------------------------------------------------------

    pub async fn add_game_to_steam(
        &self,
        game_id: &str,
        compatibility_tool: &str,
    ) -> AddGameResult {
        let result = self.steam.bind(game_id, compatibility_tool).await;
        if result.success {
            self.request_save();
        }
        result
    }

    pub async fn remove_game_from_steam(&self, app_id: &str) -> OpOutcome {
        let result = self.steam.unbind(app_id).await;
        if result.success {
            self.request_save();
        }
        result
    }

    pub async fn configure_wine_components(
        &self,
        app_id: &str,
        components: &[String],
        locale: Option<&str>,
    ) -> OpOutcome {
        self.steam.configure(app_id, components, locale).await
    }

    pub async fn steam_game_info(&self, game_id: &str) -> Option<Value> {
        self.steam.describe(game_id).await
    }

    pub async fn proton_versions(&self) -> Vec<Value> {
        self.steam.proton_versions().await
    }

    // -----------------------------------------------------------------------
    // Library maintenance
    // -----------------------------------------------------------------------

    pub async fn add_game_tag(&self, game_id: &str, tag: &str) -> OpResult {
        match self.library_ops.add_tag(game_id, tag).await {
            Ok(added) => OpResult {
                success: added,
                message: None,
            },
            Err(e) => {
                error!(game_id, error = %e, "failed to add tag");
                OpResult::fail(e)
            }
        }
    }

    pub async fn remove_game_tag(&self, game_id: &str, tag: &str) -> OpResult {
        match self.library_ops.remove_tag(game_id, tag).await {
            Ok(removed) => OpResult {
                success: removed,
                message: None,
            },
            Err(e) => {
                error!(game_id, error = %e, "failed to remove tag");
                OpResult::fail(e)
            }
        }
    }

    pub async fn game_tags(&self, game_id: &str) -> Vec<String> {
        match self.library_ops.game_tags(game_id).await {
            Ok(tags) => tags,
            Err(e) => {
                error!(game_id, error = %e, "failed to list game tags");
                Vec::new()
            }
        }
    }

    pub async fn all_tags(&self) -> Vec<String> {
        match self.library_ops.all_tags().await {
            Ok(tags) => tags,
            Err(e) => {
                error!(error = %e, "failed to list tags");
                Vec::new()
            }
        }
    }

    /// Creates a game backup; an empty path selects the default backup dir.
    pub async fn backup_game(&self, game_id: &str, backup_path: &str) -> Value {
        let path = if backup_path.is_empty() {
            self.games_dir.join("backups")
        } else {
            PathBuf::from(backup_path)
        };

        match self.library_ops.backup_game(game_id, &path).await {
            Ok(result) => result,
            Err(e) => {
                error!(game_id, error = %e, "backup failed");
                failure_value(e)
            }
        }
    }

    pub async fn restore_game(&self, game_id: &str, backup_path: &str) -> Value {
        match self
            .library_ops
            .restore_game(game_id, &PathBuf::from(backup_path))
            .await
        {
            Ok(result) => result,
            Err(e) => {
                error!(game_id, error = %e, "restore failed");
                failure_value(e)
            }
        }
    }

    pub async fn library_statistics(&self) -> Value {
        match self.library_ops.statistics().await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "failed to compute library statistics");
                failure_value(e)
            }
        }
    }

    pub async fn optimize_library(&self) -> Value {
        match self.library_ops.optimize().await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "library optimization failed");
                failure_value(e)
            }
        }
    }

    pub async fn update_last_played(&self, game_id: &str) -> OpResult {
        match self.library_ops.update_last_played(game_id).await {
            Ok(()) => {
                self.request_save();
                OpResult::ok()
            }
            Err(e) => {
                error!(game_id, error = %e, "failed to update last played");
                OpResult::fail(e)
            }
        }
    }

    pub async fn cleanup_orphaned_games(&self) -> usize {
        match self.library_ops.cleanup_orphaned().await {
            Ok(cleaned) => cleaned,
            Err(e) => {
                error!(error = %e, "orphan cleanup failed");
                0
            }
        }
    }

    /// Deletes a game's files and tears its binding down.
    ///
    /// The local binding is forced off even when Steam-side removal fails:
    /// the files no longer exist, so the game cannot stay bound.
    pub async fn delete_game(&self, game_id: &str, remove_from_steam: bool) -> OpResult {
        let binding = self.steam.binding_of(game_id).await;

        let deleted = match self.library_ops.delete_game(game_id).await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!(game_id, error = %e, "failed to delete game files");
                false
            }
        };

        if remove_from_steam {
            if let Some(binding) = binding {
                let removal = self.steam.unbind(&binding.app_id).await;
                if !removal.success {
                    warn!(
                        game_id,
                        app_id = %binding.app_id,
                        "Steam removal failed during game deletion"
                    );
                }
                self.steam.force_unbind_local(game_id).await;
            }
        }

        if deleted {
            self.request_save();
        }
        OpResult {
            success: deleted,
            message: None,
        }
    }

    // -----------------------------------------------------------------------
    // Persistence plumbing
    // -----------------------------------------------------------------------

    /// Schedules a debounced settings save reflecting the state at fire time.
    fn request_save(&self) {
        let session = Arc::clone(&self.session);
        let preferences = Arc::clone(&self.preferences);
        self.settings.request_debounced_save(move || async move {
            compose_blob(session.as_ref(), &preferences).await
        });
    }

    async fn snapshot_blob(&self) -> SettingsBlob {
        compose_blob(self.session.as_ref(), &self.preferences).await
    }
}

/// Assembles the persisted blob from live session state and preferences.
async fn compose_blob(
    session: &dyn ProviderSession,
    preferences: &Mutex<Preferences>,
) -> SettingsBlob {
    let state = session.export_state().await;
    SettingsBlob {
        hikari_token: state.token,
        current_server: state.selected_server,
        steam_games: Vec::new(),
        preferences: preferences.lock().await.clone(),
    }
}

/// Runs a cleanup future with the shutdown timeout; overruns are logged and
/// treated as completed.
async fn cleanup_guarded(name: &str, fut: impl std::future::Future<Output = Result<(), String>>) {
    match tokio::time::timeout(CLEANUP_TIMEOUT, fut).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(collaborator = name, error = %e, "cleanup error"),
        Err(_) => warn!(collaborator = name, "cleanup timed out, abandoning"),
    }
}

fn failure_value(message: String) -> Value {
    serde_json::json!({ "success": false, "message": message })
}
