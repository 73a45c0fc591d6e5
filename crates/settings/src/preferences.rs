//! User preference record and schema-constrained normalization.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// User-facing preferences stored inside the settings blob.
///
/// The field set is fixed. Normalization only ever copies values for these
/// keys, so unknown keys in an incoming payload are dropped silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub language: String,
    pub default_proton_version: String,
    pub auto_update: bool,
    pub download_path: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "en".into(),
            default_proton_version: "proton_experimental".into(),
            auto_update: true,
            download_path: String::new(),
        }
    }
}

impl Preferences {
    /// Normalizes a raw preference payload against a template.
    ///
    /// Anything that is not a JSON object yields the template unchanged.
    /// Otherwise each template field is updated only when the incoming value
    /// has the matching JSON type; a mismatched or absent value keeps the
    /// template's value.
    pub fn normalize(raw: Option<&Value>, template: &Preferences) -> Preferences {
        let mut prefs = template.clone();
        let Some(Value::Object(map)) = raw else {
            return prefs;
        };

        if let Some(value) = map.get("language").and_then(Value::as_str) {
            prefs.language = value.to_string();
        }
        if let Some(value) = map.get("defaultProtonVersion").and_then(Value::as_str) {
            prefs.default_proton_version = coerce_proton_identifier(value);
        }
        if let Some(value) = map.get("downloadPath").and_then(Value::as_str) {
            prefs.download_path = value.to_string();
        }
        if let Some(value) = map.get("autoUpdate").and_then(Value::as_bool) {
            prefs.auto_update = value;
        }

        prefs
    }
}

/// Maps loosely-specified Proton identifiers onto canonical ones.
///
/// Unrecognized strings pass through verbatim so identifiers newer than this
/// table keep working without a schema change.
pub fn coerce_proton_identifier(value: &str) -> String {
    match value {
        "experimental" | "proton_experimental" => "proton_experimental".into(),
        "9.0" | "proton_9.0" | "proton_90" => "proton_90".into(),
        "8.0" | "proton_8.0" | "proton_80" => "proton_80".into(),
        other => other.into(),
    }
}

/// Loads the bundled preference defaults file, layered over the hard-coded
/// defaults.
///
/// A missing or malformed file degrades silently to the hard-coded values.
pub fn load_default_preferences(path: &Path) -> Preferences {
    let base = Preferences::default();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return base,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read default preferences");
            return base;
        }
    };

    match serde_json::from_str::<Value>(&contents) {
        Ok(payload) => Preferences::normalize(Some(&payload), &base),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse default preferences");
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_non_object_returns_template() {
        let template = Preferences {
            language: "ja".into(),
            ..Preferences::default()
        };

        assert_eq!(Preferences::normalize(None, &template), template);
        assert_eq!(
            Preferences::normalize(Some(&json!("nonsense")), &template),
            template
        );
        assert_eq!(
            Preferences::normalize(Some(&json!([1, 2, 3])), &template),
            template
        );
    }

    #[test]
    fn normalize_accepts_matching_types_only() {
        let template = Preferences::default();
        let raw = json!({
            "language": "ja",
            "autoUpdate": "yes",
            "downloadPath": 42,
        });

        let prefs = Preferences::normalize(Some(&raw), &template);
        assert_eq!(prefs.language, "ja");
        // Wrong types keep the template values.
        assert!(prefs.auto_update);
        assert_eq!(prefs.download_path, "");
    }

    #[test]
    fn normalize_drops_unknown_keys() {
        let template = Preferences::default();
        let raw = json!({
            "language": "en",
            "theme": "dark",
            "telemetry": true,
        });

        let prefs = Preferences::normalize(Some(&raw), &template);
        let round_trip = serde_json::to_value(&prefs).unwrap();
        let keys: Vec<&String> = round_trip.as_object().unwrap().keys().collect();
        assert_eq!(
            keys,
            vec!["language", "defaultProtonVersion", "autoUpdate", "downloadPath"]
        );
    }

    #[test]
    fn normalize_coerces_proton_aliases() {
        let template = Preferences::default();
        let raw = json!({ "defaultProtonVersion": "experimental" });
        let prefs = Preferences::normalize(Some(&raw), &template);
        assert_eq!(prefs.default_proton_version, "proton_experimental");

        let raw = json!({ "defaultProtonVersion": "9.0" });
        let prefs = Preferences::normalize(Some(&raw), &template);
        assert_eq!(prefs.default_proton_version, "proton_90");
    }

    #[test]
    fn unrecognized_proton_identifier_passes_through() {
        assert_eq!(coerce_proton_identifier("proton_ge_9_20"), "proton_ge_9_20");
        assert_eq!(coerce_proton_identifier("proton_8.0"), "proton_80");
    }

    #[test]
    fn default_preferences_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = load_default_preferences(&dir.path().join("settings.json"));
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn default_preferences_from_bundled_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "language": "zh-CN", "autoUpdate": false }"#).unwrap();

        let prefs = load_default_preferences(&path);
        assert_eq!(prefs.language, "zh-CN");
        assert!(!prefs.auto_update);
        assert_eq!(prefs.default_proton_version, "proton_experimental");
    }

    #[test]
    fn malformed_defaults_file_degrades_to_hard_coded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_default_preferences(&path), Preferences::default());
    }
}
