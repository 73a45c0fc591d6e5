//! Download lifecycle coordination.
//!
//! The download engine collaborator does the actual transfer work (chunking,
//! resume, checksums). This crate translates high-level intents into engine
//! calls and normalizes the engine's heterogeneous status shapes into one
//! canonical progress record with a defined zero-value for every field, so a
//! missing or error response never propagates a raw absence upward.
//!
//! No engine call is retried here; retry policy belongs to the engine.

pub mod coordinator;
pub mod engine;
pub mod status;

pub use coordinator::DownloadCoordinator;
pub use engine::DownloadEngine;
pub use status::{
    DownloadProgressRecord, DownloadStatus, EngineAck, EngineStatusReport, OpResult,
    RawEngineStatus, normalize_status,
};

/// Errors produced by the download engine collaborator.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("engine error: {0}")]
    Engine(String),
}
