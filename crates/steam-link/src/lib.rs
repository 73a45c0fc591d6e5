//! Steam binding lifecycle for local games.
//!
//! A *binding* is the persisted association between a local game id and the
//! Steam app id it was added under, plus its compatibility configuration
//! (Proton tool, Wine components, locale). The platform integration
//! collaborator performs the actual Steam operations; this crate keeps the
//! cross-reference in the game's metadata record consistent across
//! add/remove/configure, and cleans up dangling references.
//!
//! State machine per game: unbound → bound (successful add) → reconfigured
//! (configure, self-loop) → unbound (successful remove). Game deletion
//! forces unbound regardless of platform removal success.

pub mod binder;
pub mod traits;
pub mod types;

pub use binder::SteamMetadataBinder;
pub use traits::{MetadataStore, SteamIntegration};
pub use types::{AddGameResult, OpOutcome, SteamBinding};

/// Errors produced by the Steam integration collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SteamLinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("integration error: {0}")]
    Integration(String),

    #[error("metadata error: {0}")]
    Metadata(String),
}
