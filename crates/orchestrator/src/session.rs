//! Session state exchange with the primary catalog provider.

use std::future::Future;
use std::pin::Pin;

/// Authentication/session state re-exported into the settings blob.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub token: Option<String>,
    pub selected_server: Option<String>,
}

/// The token-bearing provider whose session survives restarts.
///
/// Exported at save time and imported back at startup; the provider owns the
/// actual credentials, this layer only shuttles them to and from disk.
pub trait ProviderSession: Send + Sync {
    fn export_state(&self) -> Pin<Box<dyn Future<Output = SessionState> + Send + '_>>;

    fn import_state(
        &self,
        token: Option<String>,
        selected_server: Option<String>,
    ) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>>;
}
