//! Host runtime contract: directories and legacy settings migration.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Directories supplied by the host plugin runtime.
#[derive(Debug, Clone)]
pub struct HostPaths {
    /// Where `settings.json` and the bundled `defaults/` live.
    pub settings_dir: PathBuf,
    /// Runtime data root; game files go under `<runtime_dir>/games`.
    pub runtime_dir: PathBuf,
    /// Plugin installation root, for bundled read-only assets.
    pub plugin_dir: PathBuf,
}

impl HostPaths {
    /// Directory holding downloaded game files.
    pub fn games_dir(&self) -> PathBuf {
        self.runtime_dir.join("games")
    }

    /// Directory holding per-game Proton environments.
    pub fn proton_dir(&self) -> PathBuf {
        self.games_dir().join("proton_environments")
    }

    /// Path of the persisted settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.settings_dir.join("settings.json")
    }

    /// Path of the bundled preference defaults file.
    pub fn defaults_file(&self) -> PathBuf {
        self.plugin_dir.join("defaults").join("settings.json")
    }
}

/// The host facilities the orchestrator relies on beyond plain paths.
///
/// The migration payload format is the host's concern; it is treated as
/// opaque here.
pub trait HostRuntime: Send + Sync {
    /// The pre-plugin settings directory, if this host ever had one.
    fn legacy_settings_dir(&self) -> Option<PathBuf>;

    /// Migrates an old settings directory into the host-managed location.
    fn migrate_settings(&self, path: &Path) -> Result<(), String>;
}

/// Migrates legacy settings on first run, when a legacy directory exists.
///
/// Failures are logged and otherwise ignored; a failed migration leaves the
/// plugin starting from defaults, which is always safe.
pub fn migrate_legacy(host: &dyn HostRuntime) {
    let Some(legacy_dir) = host.legacy_settings_dir() else {
        return;
    };
    if !legacy_dir.exists() {
        return;
    }

    info!(path = %legacy_dir.display(), "migrating legacy settings");
    if let Err(e) = host.migrate_settings(&legacy_dir) {
        warn!(path = %legacy_dir.display(), error = %e, "legacy settings migration failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct MockHost {
        legacy_dir: Option<PathBuf>,
        migrated: Mutex<Vec<PathBuf>>,
    }

    impl HostRuntime for MockHost {
        fn legacy_settings_dir(&self) -> Option<PathBuf> {
            self.legacy_dir.clone()
        }

        fn migrate_settings(&self, path: &Path) -> Result<(), String> {
            self.migrated.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn migrates_when_legacy_dir_exists() {
        let dir = tempfile::tempdir().unwrap();
        let host = MockHost {
            legacy_dir: Some(dir.path().to_path_buf()),
            migrated: Mutex::new(Vec::new()),
        };

        migrate_legacy(&host);
        assert_eq!(*host.migrated.lock().unwrap(), vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn skips_when_legacy_dir_missing() {
        let host = MockHost {
            legacy_dir: Some(PathBuf::from("/nonexistent/legacy-settings")),
            migrated: Mutex::new(Vec::new()),
        };

        migrate_legacy(&host);
        assert!(host.migrated.lock().unwrap().is_empty());
    }

    #[test]
    fn derived_paths() {
        let paths = HostPaths {
            settings_dir: PathBuf::from("/settings"),
            runtime_dir: PathBuf::from("/runtime"),
            plugin_dir: PathBuf::from("/plugin"),
        };

        assert_eq!(paths.games_dir(), PathBuf::from("/runtime/games"));
        assert_eq!(
            paths.proton_dir(),
            PathBuf::from("/runtime/games/proton_environments")
        );
        assert_eq!(paths.settings_file(), PathBuf::from("/settings/settings.json"));
        assert_eq!(
            paths.defaults_file(),
            PathBuf::from("/plugin/defaults/settings.json")
        );
    }
}
