//! Collaborator traits for the binding lifecycle.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};

use crate::SteamLinkError;
use crate::types::{AddGameResult, OpOutcome};

/// The platform integration that manipulates the actual Steam library
/// (shortcut creation, compatibility tool assignment, winetricks).
pub trait SteamIntegration: Send + Sync {
    /// Adds a game to Steam under the given compatibility tool.
    fn add_game(
        &self,
        game_id: &str,
        game_name: &str,
        executable: &str,
        game_dir: &str,
        compatibility_tool: &str,
    ) -> Pin<Box<dyn Future<Output = Result<AddGameResult, SteamLinkError>> + Send + '_>>;

    /// Removes a game from Steam by app id.
    fn remove_game(
        &self,
        app_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<OpOutcome, SteamLinkError>> + Send + '_>>;

    /// Installs Wine components and/or sets the Wine locale for an app.
    fn configure_winetricks(
        &self,
        app_id: &str,
        components: &[String],
        locale: Option<&str>,
    ) -> Pin<Box<dyn Future<Output = Result<OpOutcome, SteamLinkError>> + Send + '_>>;

    /// Live Steam-side info for an app; `None` when Steam does not know it.
    fn game_info(
        &self,
        app_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Value>, SteamLinkError>> + Send + '_>>;

    /// Available Proton/compatibility tool descriptors.
    fn proton_versions(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Value>, SteamLinkError>> + Send + '_>>;
}

/// Per-game metadata storage owned by the library collaborator.
pub trait MetadataStore: Send + Sync {
    /// Ids of all installed games.
    fn installed_ids(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, SteamLinkError>> + Send + '_>>;

    /// The game's mutable metadata record.
    fn load_metadata(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Map<String, Value>, SteamLinkError>> + Send + '_>>;

    /// Persists a metadata record; `false` means the store refused the write.
    fn store_metadata(
        &self,
        game_id: &str,
        metadata: Map<String, Value>,
    ) -> Pin<Box<dyn Future<Output = Result<bool, SteamLinkError>> + Send + '_>>;

    /// Cached catalog info for the game, if the library has seen it.
    fn cached_info(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Option<Value>> + Send + '_>>;

    /// Path of the game's launch executable, if one was detected.
    fn executable(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + '_>>;
}
