//! Settings persistence for the library manager.
//!
//! This crate owns two things:
//!
//! - **Preference normalization** — a raw preference payload is validated
//!   against a fixed schema; unknown keys are dropped, type-mismatched values
//!   are rejected in favor of the existing ones.
//! - **The settings store** — atomic (temp file + rename) persistence of the
//!   full settings blob, with a single-slot debounce so a burst of updates
//!   produces exactly one disk write.
//!
//! Load never fails: a missing or unreadable file yields defaults. Save
//! failures are reported to the caller, who logs and keeps the in-memory
//! state authoritative until the next save.

pub mod preferences;
pub mod store;

pub use preferences::{Preferences, coerce_proton_identifier, load_default_preferences};
pub use store::{SettingsBlob, SettingsStore};

/// Errors produced while persisting settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
