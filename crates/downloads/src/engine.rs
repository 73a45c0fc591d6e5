//! Abstract download engine collaborator.

use std::future::Future;
use std::pin::Pin;

use crate::DownloadError;
use crate::status::{EngineAck, RawEngineStatus};

/// The byte-level download engine (chunking, resume, checksum verification).
///
/// The coordinator only sees this trait. Acknowledgements and status payloads
/// stay in their raw shapes — normalization happens in one place on the
/// coordinator side.
pub trait DownloadEngine: Send + Sync {
    /// Starts a multi-part download. `urls` is non-empty and pre-filtered.
    fn start(
        &self,
        game_id: &str,
        game_name: &str,
        urls: Vec<String>,
        expected_size: Option<u64>,
        integrity_hash: Option<String>,
    ) -> Pin<Box<dyn Future<Output = Result<EngineAck, DownloadError>> + Send + '_>>;

    fn pause(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EngineAck, DownloadError>> + Send + '_>>;

    fn resume(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EngineAck, DownloadError>> + Send + '_>>;

    fn cancel(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EngineAck, DownloadError>> + Send + '_>>;

    /// Switches the primary download source for an in-flight transfer.
    fn switch_source(
        &self,
        game_id: &str,
        preferred_source: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EngineAck, DownloadError>> + Send + '_>>;

    /// Raw status for one game; `None` when the engine has no record of it.
    fn status(
        &self,
        game_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<RawEngineStatus>, DownloadError>> + Send + '_>>;

    /// Raw status payloads for every active download.
    fn active_downloads(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawEngineStatus>, DownloadError>> + Send + '_>>;

    /// Releases engine resources on shutdown.
    fn cleanup(&self) -> Pin<Box<dyn Future<Output = Result<(), DownloadError>> + Send + '_>>;
}
