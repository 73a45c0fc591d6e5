//! Atomic, debounced persistence of the settings blob.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::SettingsError;
use crate::preferences::Preferences;

/// Default quiet period before a requested save actually runs.
const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// The full persisted settings unit.
///
/// Session state is re-exported from the catalog provider at save time;
/// `steam_games` is reserved and currently always empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsBlob {
    pub hikari_token: Option<String>,
    pub current_server: Option<String>,
    pub steam_games: Vec<Value>,
    pub preferences: Preferences,
}

/// On-disk shape, parsed tolerantly. Preferences stay raw until normalized.
#[derive(Debug, Default, Deserialize)]
struct RawBlob {
    #[serde(default)]
    hikari_token: Option<String>,
    #[serde(default)]
    current_server: Option<String>,
    #[serde(default)]
    steam_games: Vec<Value>,
    #[serde(default)]
    preferences: Option<Value>,
}

/// Persists [`SettingsBlob`] to a single JSON file.
///
/// All load/save operations serialize against one lock scoped to the store.
/// Writes go to a sibling temp file followed by an atomic rename, so a
/// concurrent reader sees either the old or the new file in full.
pub struct SettingsStore {
    path: PathBuf,
    defaults: Preferences,
    debounce_delay: Duration,
    io_lock: Mutex<()>,
    // Single-slot debounce: arming while armed cancels-and-replaces.
    pending: StdMutex<Option<CancellationToken>>,
}

impl SettingsStore {
    /// Creates a store persisting to `path` (typically `<dir>/settings.json`).
    pub fn new(path: PathBuf, defaults: Preferences) -> Self {
        Self {
            path,
            defaults,
            debounce_delay: DEFAULT_DEBOUNCE_DELAY,
            io_lock: Mutex::new(()),
            pending: StdMutex::new(None),
        }
    }

    /// Overrides the debounce quiet period.
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    /// Path of the persisted settings file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Loads the persisted blob.
    ///
    /// A missing file yields defaults without signaling failure; read or
    /// parse errors are logged and also degrade to defaults.
    pub async fn load(&self) -> SettingsBlob {
        let _guard = self.io_lock.lock().await;

        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return self.default_blob();
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to read settings");
                return self.default_blob();
            }
        };

        match serde_json::from_str::<RawBlob>(&contents) {
            Ok(raw) => SettingsBlob {
                hikari_token: raw.hikari_token,
                current_server: raw.current_server,
                steam_games: raw.steam_games,
                preferences: Preferences::normalize(raw.preferences.as_ref(), &self.defaults),
            },
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to parse settings");
                self.default_blob()
            }
        }
    }

    /// Saves the blob atomically.
    pub async fn save(&self, blob: &SettingsBlob) -> Result<(), SettingsError> {
        let _guard = self.io_lock.lock().await;
        self.write_atomic(blob).await
    }

    /// Requests a debounced save, superseding any not-yet-fired request.
    ///
    /// The `snapshot` provider runs when the timer fires, so the write
    /// reflects the state at fire time, not at request time. Cancellation of
    /// a superseded request is silent.
    pub fn request_debounced_save<F, Fut>(self: &Arc<Self>, snapshot: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = SettingsBlob> + Send + 'static,
    {
        let token = CancellationToken::new();
        let previous = self
            .pending
            .lock()
            .expect("debounce slot poisoned")
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let store = Arc::clone(self);
        let delay = store.debounce_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            // A supersede may land between the timer and the write.
            if token.is_cancelled() {
                return;
            }
            let blob = snapshot().await;
            if let Err(e) = store.save(&blob).await {
                warn!(error = %e, "debounced settings save failed");
            }
        });
    }

    /// Cancels any pending debounced save and writes `blob` immediately.
    ///
    /// Used on shutdown so a still-armed timer cannot lose the final state.
    pub async fn flush(&self, blob: &SettingsBlob) -> Result<(), SettingsError> {
        if let Some(pending) = self.pending.lock().expect("debounce slot poisoned").take() {
            pending.cancel();
        }
        self.save(blob).await
    }

    fn default_blob(&self) -> SettingsBlob {
        SettingsBlob {
            preferences: self.defaults.clone(),
            ..SettingsBlob::default()
        }
    }

    async fn write_atomic(&self, blob: &SettingsBlob) -> Result<(), SettingsError> {
        let payload = serde_json::to_string_pretty(blob)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &std::path::Path) -> Arc<SettingsStore> {
        Arc::new(SettingsStore::new(
            dir.join("settings.json"),
            Preferences::default(),
        ))
    }

    #[tokio::test]
    async fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let blob = store.load().await;
        assert_eq!(blob.hikari_token, None);
        assert_eq!(blob.current_server, None);
        assert!(blob.steam_games.is_empty());
        assert_eq!(blob.preferences, Preferences::default());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let blob = SettingsBlob {
            hikari_token: Some("tok".into()),
            current_server: Some("10.0.0.1".into()),
            steam_games: Vec::new(),
            preferences: Preferences {
                language: "ja".into(),
                ..Preferences::default()
            },
        };
        store.save(&blob).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded, blob);
    }

    #[tokio::test]
    async fn load_corrupt_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(store.path(), "{ truncated").unwrap();

        let blob = store.load().await;
        assert_eq!(blob.preferences, Preferences::default());
    }

    #[tokio::test]
    async fn load_normalizes_persisted_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let on_disk = json!({
            "hikari_token": "tok",
            "preferences": {
                "language": "ja",
                "autoUpdate": "not-a-bool",
                "stray": 1,
            }
        });
        std::fs::write(store.path(), on_disk.to_string()).unwrap();

        let blob = store.load().await;
        assert_eq!(blob.hikari_token.as_deref(), Some("tok"));
        assert_eq!(blob.preferences.language, "ja");
        assert!(blob.preferences.auto_update);
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.save(&SettingsBlob::default()).await.unwrap();

        assert!(store.path().exists());
        assert!(!dir.path().join("settings.json.tmp").exists());
    }

    #[tokio::test]
    async fn stale_temp_file_does_not_affect_load() {
        // Simulates a crash between the temp write and the rename: the target
        // must still hold the previous complete payload.
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let blob = SettingsBlob {
            hikari_token: Some("kept".into()),
            ..SettingsBlob::default()
        };
        store.save(&blob).await.unwrap();
        std::fs::write(dir.path().join("settings.json.tmp"), "{ partial wri").unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.hikari_token.as_deref(), Some("kept"));
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_coalesces_to_one_write_with_last_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        for i in 0..5 {
            let blob = SettingsBlob {
                hikari_token: Some(format!("token-{i}")),
                ..SettingsBlob::default()
            };
            store.request_debounced_save(move || async move { blob });
        }

        // Nothing on disk before the quiet period elapses.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!store.path().exists());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let loaded = store.load().await;
        assert_eq!(loaded.hikari_token.as_deref(), Some("token-4"));
    }

    #[tokio::test(start_paused = true)]
    async fn new_request_supersedes_pending_timer() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let first = SettingsBlob {
            hikari_token: Some("first".into()),
            ..SettingsBlob::default()
        };
        store.request_debounced_save(move || async move { first });

        // Re-arm most of the way through the first window.
        tokio::time::sleep(Duration::from_millis(400)).await;
        let second = SettingsBlob {
            hikari_token: Some("second".into()),
            ..SettingsBlob::default()
        };
        store.request_debounced_save(move || async move { second });

        // The first timer would have fired by now; only the second may write.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!store.path().exists());

        tokio::time::sleep(Duration::from_secs(1)).await;
        let loaded = store.load().await;
        assert_eq!(loaded.hikari_token.as_deref(), Some("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_cancels_pending_and_writes_now() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let pending = SettingsBlob {
            hikari_token: Some("pending".into()),
            ..SettingsBlob::default()
        };
        store.request_debounced_save(move || async move { pending });

        let final_blob = SettingsBlob {
            hikari_token: Some("final".into()),
            ..SettingsBlob::default()
        };
        store.flush(&final_blob).await.unwrap();

        // Let the (cancelled) timer window elapse; the flushed state stays.
        tokio::time::sleep(Duration::from_secs(2)).await;
        let loaded = store.load().await;
        assert_eq!(loaded.hikari_token.as_deref(), Some("final"));
    }
}
