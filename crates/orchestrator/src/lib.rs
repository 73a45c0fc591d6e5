//! Orchestration layer for the library manager.
//!
//! The host plugin runtime drives this crate: it supplies directories and a
//! migration facility, constructs the collaborator clients (catalog
//! providers, download engine, library store, Steam integration), and calls
//! [`Orchestrator::initialize`] at startup and [`Orchestrator::shutdown`] at
//! teardown. Everything user-facing goes through the [`Orchestrator`]'s
//! request surface, which never raises a fault — collaborator failures come
//! back as empty/default results or `{success: false, message}` data.

pub mod host;
pub mod library_ops;
pub mod orchestrator;
pub mod session;

pub use host::{HostPaths, HostRuntime, migrate_legacy};
pub use library_ops::LibraryOps;
pub use orchestrator::{BackendStatus, Collaborators, Orchestrator};
pub use session::{ProviderSession, SessionState};

/// Errors surfaced during orchestrator construction.
///
/// Once initialized, public operations return values instead of errors.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings error: {0}")]
    Settings(#[from] vndeck_settings::SettingsError),

    #[error("host error: {0}")]
    Host(String),
}
