//! Canonical progress record and raw engine status normalization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed status vocabulary exposed to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    #[default]
    Pending,
    Downloading,
    Paused,
    Failed,
    Completed,
    Error,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Pending => "pending",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Paused => "paused",
            DownloadStatus::Failed => "failed",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Error => "error",
        }
    }

    /// Parses an engine status token, case-insensitively.
    ///
    /// Tokens outside the vocabulary fold to `Downloading`, the engine's
    /// default for a live transfer.
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "pending" => DownloadStatus::Pending,
            "paused" => DownloadStatus::Paused,
            "failed" => DownloadStatus::Failed,
            "completed" => DownloadStatus::Completed,
            "error" => DownloadStatus::Error,
            _ => DownloadStatus::Downloading,
        }
    }
}

/// Normalized download progress, always fully populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgressRecord {
    pub game_id: String,
    pub game_name: String,
    pub progress: f64,
    pub speed: f64,
    pub eta: f64,
    pub status: DownloadStatus,
    pub total_size: u64,
    pub downloaded_size: u64,
    pub resumable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl DownloadProgressRecord {
    /// Zero-value record for a game the engine knows nothing about.
    pub fn pending(game_id: &str) -> Self {
        Self {
            game_id: game_id.into(),
            game_name: format!("Game {game_id}"),
            progress: 0.0,
            speed: 0.0,
            eta: 0.0,
            status: DownloadStatus::Pending,
            total_size: 0,
            downloaded_size: 0,
            resumable: false,
            message: None,
            started_at: None,
            updated_at: None,
        }
    }

    /// Zero-value record carrying an engine failure as data.
    pub fn error(game_id: &str, message: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Error,
            message: Some(message.into()),
            ..Self::pending(game_id)
        }
    }
}

/// One engine status payload, tolerant of both naming conventions.
///
/// The engine reports snake-case; older builds reported camel-case and `eta`
/// instead of `eta_seconds`. Every field is optional — normalization supplies
/// the zero-value defaults. Serialization (the detailed-status passthrough)
/// emits snake-case and drops absent fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStatusReport {
    #[serde(default, alias = "gameId", skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, alias = "gameName", skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, alias = "etaSeconds", skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<f64>,
    #[serde(default, alias = "totalSize", skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
    #[serde(default, alias = "downloadedSize", skip_serializing_if = "Option::is_none")]
    pub downloaded_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resumable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, alias = "startedAt", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Engine-specific detail (chunk layout, per-source state) kept verbatim
    /// for the detailed-status passthrough.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sum of the status shapes the engine is known to produce.
///
/// Any JSON object parses as a [`EngineStatusReport`]; anything else (the
/// engine has historically emitted bare nulls on teardown) falls into
/// `Other` and normalizes to the pending zero-values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEngineStatus {
    Report(EngineStatusReport),
    Other(Value),
}

/// Maps every raw status variant onto the canonical record.
///
/// `resumable` defaults to true when the status is paused or failed, unless
/// the engine stated it explicitly.
pub fn normalize_status(game_id: &str, raw: Option<RawEngineStatus>) -> DownloadProgressRecord {
    let report = match raw {
        Some(RawEngineStatus::Report(report)) => report,
        Some(RawEngineStatus::Other(_)) | None => return DownloadProgressRecord::pending(game_id),
    };

    let status = report
        .status
        .as_deref()
        .map(DownloadStatus::parse)
        .unwrap_or(DownloadStatus::Downloading);
    let resumable = report
        .resumable
        .unwrap_or(matches!(status, DownloadStatus::Paused | DownloadStatus::Failed));

    DownloadProgressRecord {
        game_id: game_id.into(),
        game_name: report
            .game_name
            .unwrap_or_else(|| format!("Game {game_id}")),
        progress: report.progress.unwrap_or(0.0),
        speed: report.speed.unwrap_or(0.0),
        eta: report.eta_seconds.or(report.eta).unwrap_or(0.0),
        status,
        total_size: report.total_size.unwrap_or(0),
        downloaded_size: report.downloaded_size.unwrap_or(0),
        resumable,
        message: report.message,
        started_at: report.started_at,
        updated_at: report.updated_at,
    }
}

/// Raw acknowledgement from the engine; `success` may be absent entirely.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineAck {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Fixed `{success, message?}` shape returned for every intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OpResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

impl From<EngineAck> for OpResult {
    fn from(ack: EngineAck) -> Self {
        Self {
            success: ack.success.unwrap_or(false),
            message: ack.message,
        }
    }
}
