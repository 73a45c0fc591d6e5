//! Download coordinator — intent translation and status normalization.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, warn};

use crate::engine::DownloadEngine;
use crate::status::{DownloadProgressRecord, OpResult, RawEngineStatus, normalize_status};

/// Translates high-level download intents into engine calls.
///
/// Every operation returns a value; engine failures come back as
/// `{success: false, message}` or an `error`-status record, never as a fault.
pub struct DownloadCoordinator {
    engine: Arc<dyn DownloadEngine>,
}

impl DownloadCoordinator {
    pub fn new(engine: Arc<dyn DownloadEngine>) -> Self {
        Self { engine }
    }

    /// Starts a download from a raw provider URL payload.
    ///
    /// Non-string entries are filtered out first; an empty remainder is
    /// rejected without touching the engine. This covers both "provider
    /// returned nothing" and "provider returned a malformed payload".
    pub async fn start(
        &self,
        game_id: &str,
        game_name: &str,
        urls: &[Value],
        expected_size: Option<u64>,
        integrity_hash: Option<String>,
    ) -> OpResult {
        let url_list: Vec<String> = urls
            .iter()
            .filter_map(|url| url.as_str().map(str::to_string))
            .collect();

        if url_list.is_empty() {
            return OpResult::fail("No valid download URLs returned");
        }

        match self
            .engine
            .start(game_id, game_name, url_list, expected_size, integrity_hash)
            .await
        {
            Ok(ack) => ack.into(),
            Err(e) => {
                error!(game_id, error = %e, "failed to start download");
                OpResult::fail(e.to_string())
            }
        }
    }

    pub async fn pause(&self, game_id: &str) -> OpResult {
        match self.engine.pause(game_id).await {
            Ok(ack) => ack.into(),
            Err(e) => {
                error!(game_id, error = %e, "failed to pause download");
                OpResult::fail(e.to_string())
            }
        }
    }

    pub async fn resume(&self, game_id: &str) -> OpResult {
        match self.engine.resume(game_id).await {
            Ok(ack) => ack.into(),
            Err(e) => {
                error!(game_id, error = %e, "failed to resume download");
                OpResult::fail(e.to_string())
            }
        }
    }

    pub async fn cancel(&self, game_id: &str) -> OpResult {
        match self.engine.cancel(game_id).await {
            Ok(ack) => ack.into(),
            Err(e) => {
                error!(game_id, error = %e, "failed to cancel download");
                OpResult::fail(e.to_string())
            }
        }
    }

    pub async fn switch_source(&self, game_id: &str, preferred_source: &str) -> OpResult {
        match self.engine.switch_source(game_id, preferred_source).await {
            Ok(ack) => ack.into(),
            Err(e) => {
                error!(game_id, error = %e, "failed to switch download source");
                OpResult::fail(e.to_string())
            }
        }
    }

    /// Canonical progress for one game.
    pub async fn status(&self, game_id: &str) -> DownloadProgressRecord {
        match self.engine.status(game_id).await {
            Ok(raw) => normalize_status(game_id, raw),
            Err(e) => {
                error!(game_id, error = %e, "failed to get download status");
                DownloadProgressRecord::error(game_id, e.to_string())
            }
        }
    }

    /// Raw engine status for one game, unnormalized.
    ///
    /// The detailed view keeps whatever extra fields the engine reports
    /// (chunk layout, per-source state); `None` when the engine has no
    /// record of the game or fails.
    pub async fn detailed_status(&self, game_id: &str) -> Option<RawEngineStatus> {
        match self.engine.status(game_id).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(game_id, error = %e, "failed to get detailed download status");
                None
            }
        }
    }

    /// Canonical progress for every active download.
    pub async fn active_downloads(&self) -> Vec<DownloadProgressRecord> {
        let raw_list = match self.engine.active_downloads().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "failed to list active downloads");
                return Vec::new();
            }
        };

        raw_list
            .into_iter()
            .map(|raw| {
                let game_id = match &raw {
                    RawEngineStatus::Report(report) => {
                        report.game_id.clone().unwrap_or_default()
                    }
                    RawEngineStatus::Other(_) => String::new(),
                };
                normalize_status(&game_id, Some(raw))
            })
            .collect()
    }

    /// Shuts the engine down; failures are logged, not surfaced.
    pub async fn cleanup(&self) -> Result<(), crate::DownloadError> {
        self.engine.cleanup().await
    }
}
