//! Library maintenance operations delegated to the on-disk game store.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde_json::Value;

use vndeck_catalog::CatalogEntry;

/// Maintenance surface of the library collaborator: tags, backups,
/// statistics, deletion, listing filter/sort. Result payloads stay raw
/// JSON — their shapes belong to the collaborator and are passed through to
/// the caller-facing layer.
pub trait LibraryOps: Send + Sync {
    /// Filters a listing by the collaborator's criteria object (tags,
    /// installed state, text match).
    fn filter_games(
        &self,
        games: Vec<CatalogEntry>,
        filters: &Value,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CatalogEntry>, String>> + Send + '_>>;

    /// Sorts a listing by a canonical sort key.
    fn sort_games(
        &self,
        games: Vec<CatalogEntry>,
        sort_by: &str,
        reverse: bool,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CatalogEntry>, String>> + Send + '_>>;

    fn add_tag(
        &self,
        game_id: &str,
        tag: &str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, String>> + Send + '_>>;

    fn remove_tag(
        &self,
        game_id: &str,
        tag: &str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, String>> + Send + '_>>;

    fn game_tags(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, String>> + Send + '_>>;

    fn all_tags(&self) -> Pin<Box<dyn Future<Output = Result<Vec<String>, String>> + Send + '_>>;

    fn backup_game(
        &self,
        game_id: &str,
        backup_path: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<Value, String>> + Send + '_>>;

    fn restore_game(
        &self,
        game_id: &str,
        backup_path: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<Value, String>> + Send + '_>>;

    fn statistics(&self) -> Pin<Box<dyn Future<Output = Result<Value, String>> + Send + '_>>;

    fn optimize(&self) -> Pin<Box<dyn Future<Output = Result<Value, String>> + Send + '_>>;

    fn update_last_played(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>>;

    fn cleanup_orphaned(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<usize, String>> + Send + '_>>;

    /// Deletes the game's files; `false` when nothing was deleted.
    fn delete_game(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, String>> + Send + '_>>;
}
