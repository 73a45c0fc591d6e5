//! Binder — keeps game metadata and the Steam library consistent.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::{error, warn};

use crate::traits::{MetadataStore, SteamIntegration};
use crate::types::{AddGameResult, OpOutcome, SteamBinding};

/// Enforces the binding lifecycle across the integration and metadata
/// collaborators. All operations return data; collaborator failures are
/// logged and reported as `{success: false, message}`.
pub struct SteamMetadataBinder {
    integration: Arc<dyn SteamIntegration>,
    metadata: Arc<dyn MetadataStore>,
    games_dir: PathBuf,
}

impl SteamMetadataBinder {
    pub fn new(
        integration: Arc<dyn SteamIntegration>,
        metadata: Arc<dyn MetadataStore>,
        games_dir: PathBuf,
    ) -> Self {
        Self {
            integration,
            metadata,
            games_dir,
        }
    }

    /// Adds a game to Steam and records the binding in its metadata.
    pub async fn bind(&self, game_id: &str, compatibility_tool: &str) -> AddGameResult {
        let Some(info) = self.metadata.cached_info(game_id).await else {
            return AddGameResult::fail("Game not found");
        };
        let Some(executable) = self.metadata.executable(game_id).await else {
            return AddGameResult::fail("Game executable not found");
        };

        let game_name = info
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Game {game_id}"));
        let game_dir = self.games_dir.join(format!("game_{game_id}"));

        let result = match self
            .integration
            .add_game(
                game_id,
                &game_name,
                &executable,
                &game_dir.to_string_lossy(),
                compatibility_tool,
            )
            .await
        {
            Ok(result) => result,
            Err(e) => {
                error!(game_id, error = %e, "failed to add game to Steam");
                return AddGameResult::fail(e.to_string());
            }
        };

        if result.success {
            let mut metadata = self.load_metadata_or_empty(game_id).await;
            let binding = SteamBinding {
                app_id: result.app_id.clone().unwrap_or_default(),
                compatibility_tool: compatibility_tool.into(),
                components: Vec::new(),
                locale: None,
                added_at: Some(Utc::now().timestamp_micros() as f64 / 1e6),
            };
            // The integration may not report an app id; keep the tool and
            // timestamp anyway, but never record an empty id.
            if binding.app_id.is_empty() {
                metadata.insert("steamCompatibilityTool".into(), json!(compatibility_tool));
                metadata.insert("steamAddedAt".into(), json!(binding.added_at));
            } else {
                binding.write_into(&mut metadata);
            }
            self.store_metadata_logged(game_id, metadata).await;
        }

        result
    }

    /// Removes a game from Steam and strips the binding from whichever
    /// installed game references `app_id` (first match; ids are unique).
    pub async fn unbind(&self, app_id: &str) -> OpOutcome {
        let result = match self.integration.remove_game(app_id).await {
            Ok(result) => result,
            Err(e) => {
                error!(app_id, error = %e, "failed to remove game from Steam");
                return OpOutcome::fail(e.to_string());
            }
        };

        if result.success {
            if let Some(game_id) = self.find_bound_game(app_id).await {
                let mut metadata = self.load_metadata_or_empty(&game_id).await;
                SteamBinding::strip_from(&mut metadata);
                self.store_metadata_logged(&game_id, metadata).await;
            }
        }

        result
    }

    /// Installs Wine components/locale and mirrors the configuration into the
    /// bound game's metadata, touching nothing else.
    pub async fn configure(
        &self,
        app_id: &str,
        components: &[String],
        locale: Option<&str>,
    ) -> OpOutcome {
        let result = match self
            .integration
            .configure_winetricks(app_id, components, locale)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                error!(app_id, error = %e, "failed to configure Wine components");
                return OpOutcome::fail(e.to_string());
            }
        };

        if result.success {
            if let Some(game_id) = self.find_bound_game(app_id).await {
                let mut metadata = self.load_metadata_or_empty(&game_id).await;
                SteamBinding::configure_in(&mut metadata, components, locale);
                self.store_metadata_logged(&game_id, metadata).await;
            }
        }

        result
    }

    /// Merged Steam info for a game: integration-reported live state with the
    /// locally stored configuration layered on top.
    ///
    /// Local values win because the user's last explicit compatibility
    /// configuration is authoritative over an integration-reported default.
    pub async fn describe(&self, game_id: &str) -> Option<Value> {
        let metadata = self.load_metadata_or_empty(game_id).await;
        let app_id = metadata.get("steamAppId").and_then(Value::as_str)?.to_string();

        let live = match self.integration.game_info(&app_id).await {
            Ok(live) => live?,
            Err(e) => {
                error!(game_id, error = %e, "failed to get Steam game info");
                return None;
            }
        };

        let mut info = live.as_object().cloned().unwrap_or_default();
        info.entry("app_id").or_insert_with(|| json!(app_id));
        if let Some(tool) = metadata.get("steamCompatibilityTool") {
            info.insert("compatibility_tool".into(), tool.clone());
        }
        if let Some(components) = metadata.get("steamComponents") {
            info.insert("components".into(), components.clone());
        }
        if let Some(locale) = metadata.get("steamLocale") {
            info.insert("locale".into(), locale.clone());
        }
        info.insert("game_id".into(), json!(game_id));
        info.insert(
            "steamAddedAt".into(),
            metadata.get("steamAddedAt").cloned().unwrap_or(Value::Null),
        );

        Some(Value::Object(info))
    }

    /// The binding recorded for a game, if any.
    pub async fn binding_of(&self, game_id: &str) -> Option<SteamBinding> {
        let metadata = self.load_metadata_or_empty(game_id).await;
        SteamBinding::read_from(&metadata)
    }

    /// Strips the local binding without consulting the integration.
    ///
    /// Terminal teardown for game deletion: the files are gone, so the game
    /// is unbound regardless of what Steam-side removal reported.
    pub async fn force_unbind_local(&self, game_id: &str) -> bool {
        let mut metadata = self.load_metadata_or_empty(game_id).await;
        if !SteamBinding::strip_from(&mut metadata) {
            return false;
        }
        self.store_metadata_logged(game_id, metadata).await;
        true
    }

    /// Available compatibility tools; an integration failure yields an empty
    /// list.
    pub async fn proton_versions(&self) -> Vec<Value> {
        match self.integration.proton_versions().await {
            Ok(versions) => versions,
            Err(e) => {
                warn!(error = %e, "failed to list Proton versions");
                Vec::new()
            }
        }
    }

    /// Scans installed games for the one bound to `app_id`.
    async fn find_bound_game(&self, app_id: &str) -> Option<String> {
        let ids = match self.metadata.installed_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "failed to enumerate installed games for metadata cleanup");
                return None;
            }
        };

        for game_id in ids {
            let metadata = self.load_metadata_or_empty(&game_id).await;
            if metadata.get("steamAppId").and_then(Value::as_str) == Some(app_id) {
                return Some(game_id);
            }
        }
        None
    }

    async fn load_metadata_or_empty(&self, game_id: &str) -> Map<String, Value> {
        match self.metadata.load_metadata(game_id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(game_id, error = %e, "failed to load game metadata");
                Map::new()
            }
        }
    }

    async fn store_metadata_logged(&self, game_id: &str, metadata: Map<String, Value>) {
        match self.metadata.store_metadata(game_id, metadata).await {
            Ok(true) => {}
            Ok(false) => warn!(game_id, "metadata store refused the write"),
            Err(e) => error!(game_id, error = %e, "failed to persist game metadata"),
        }
    }
}
