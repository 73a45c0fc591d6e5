//! Binding record and its metadata-map representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Metadata keys owned by the binding. `strip_from` removes exactly this set.
const KEY_APP_ID: &str = "steamAppId";
const KEY_COMPATIBILITY_TOOL: &str = "steamCompatibilityTool";
const KEY_COMPONENTS: &str = "steamComponents";
const KEY_LOCALE: &str = "steamLocale";
const KEY_ADDED_AT: &str = "steamAddedAt";

/// Persisted association between a local game and its Steam shortcut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteamBinding {
    pub app_id: String,
    pub compatibility_tool: String,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub added_at: Option<f64>,
}

impl SteamBinding {
    /// Reads a binding out of a game's metadata map.
    ///
    /// `None` when no `steamAppId` is recorded — the game is unbound.
    pub fn read_from(metadata: &Map<String, Value>) -> Option<Self> {
        let app_id = metadata.get(KEY_APP_ID)?.as_str()?.to_string();
        Some(Self {
            app_id,
            compatibility_tool: metadata
                .get(KEY_COMPATIBILITY_TOOL)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            components: metadata
                .get(KEY_COMPONENTS)
                .and_then(Value::as_array)
                .map(|list| {
                    list.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            locale: metadata
                .get(KEY_LOCALE)
                .and_then(Value::as_str)
                .map(str::to_string),
            added_at: metadata.get(KEY_ADDED_AT).and_then(Value::as_f64),
        })
    }

    /// Writes the binding into a metadata map.
    ///
    /// Optional parts that were never configured (empty component list, no
    /// locale) are left out rather than written as empty values.
    pub fn write_into(&self, metadata: &mut Map<String, Value>) {
        metadata.insert(KEY_APP_ID.into(), json!(self.app_id));
        metadata.insert(KEY_COMPATIBILITY_TOOL.into(), json!(self.compatibility_tool));
        if !self.components.is_empty() {
            metadata.insert(KEY_COMPONENTS.into(), json!(self.components));
        }
        if let Some(locale) = &self.locale {
            metadata.insert(KEY_LOCALE.into(), json!(locale));
        }
        if let Some(added_at) = self.added_at {
            metadata.insert(KEY_ADDED_AT.into(), json!(added_at));
        }
    }

    /// Removes every Steam-owned key from a metadata map.
    ///
    /// Returns `true` when anything was removed. Unrelated keys are untouched.
    pub fn strip_from(metadata: &mut Map<String, Value>) -> bool {
        let mut removed = false;
        for key in [
            KEY_APP_ID,
            KEY_COMPATIBILITY_TOOL,
            KEY_COMPONENTS,
            KEY_LOCALE,
            KEY_ADDED_AT,
        ] {
            removed |= metadata.remove(key).is_some();
        }
        removed
    }

    /// Updates only the component/locale configuration keys in place.
    pub fn configure_in(
        metadata: &mut Map<String, Value>,
        components: &[String],
        locale: Option<&str>,
    ) {
        metadata.insert(KEY_COMPONENTS.into(), json!(components));
        if let Some(locale) = locale {
            metadata.insert(KEY_LOCALE.into(), json!(locale));
        }
    }
}

/// Result of adding a game to Steam, as reported by the integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddGameResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AddGameResult {
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            app_id: None,
            message: Some(message.into()),
        }
    }
}

/// Fixed `{success, message?}` shape for remove/configure operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OpOutcome {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_with_binding() -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("lastPlayed".into(), json!(1700000000));
        metadata.insert("steamAppId".into(), json!("480"));
        metadata.insert("steamCompatibilityTool".into(), json!("proton_experimental"));
        metadata.insert("steamComponents".into(), json!(["cjkfonts"]));
        metadata.insert("steamLocale".into(), json!("ja_JP.UTF-8"));
        metadata.insert("steamAddedAt".into(), json!(1700000123.5));
        metadata
    }

    #[test]
    fn read_from_full_record() {
        let binding = SteamBinding::read_from(&metadata_with_binding()).unwrap();
        assert_eq!(binding.app_id, "480");
        assert_eq!(binding.compatibility_tool, "proton_experimental");
        assert_eq!(binding.components, vec!["cjkfonts"]);
        assert_eq!(binding.locale.as_deref(), Some("ja_JP.UTF-8"));
        assert_eq!(binding.added_at, Some(1700000123.5));
    }

    #[test]
    fn read_from_unbound_metadata_is_none() {
        let mut metadata = Map::new();
        metadata.insert("lastPlayed".into(), json!(1700000000));
        assert!(SteamBinding::read_from(&metadata).is_none());
    }

    #[test]
    fn write_into_skips_unconfigured_parts() {
        let binding = SteamBinding {
            app_id: "480".into(),
            compatibility_tool: "proton_90".into(),
            components: Vec::new(),
            locale: None,
            added_at: Some(1.0),
        };

        let mut metadata = Map::new();
        binding.write_into(&mut metadata);
        assert_eq!(metadata.get("steamAppId"), Some(&json!("480")));
        assert!(!metadata.contains_key("steamComponents"));
        assert!(!metadata.contains_key("steamLocale"));
    }

    #[test]
    fn strip_from_removes_only_steam_keys() {
        let mut metadata = metadata_with_binding();
        assert!(SteamBinding::strip_from(&mut metadata));

        assert_eq!(metadata.len(), 1);
        assert!(metadata.contains_key("lastPlayed"));
        assert!(!SteamBinding::strip_from(&mut metadata));
    }

    #[test]
    fn configure_in_leaves_other_keys_alone() {
        let mut metadata = metadata_with_binding();
        SteamBinding::configure_in(&mut metadata, &["dotnet48".into()], None);

        assert_eq!(metadata.get("steamComponents"), Some(&json!(["dotnet48"])));
        // Locale untouched when not supplied.
        assert_eq!(metadata.get("steamLocale"), Some(&json!("ja_JP.UTF-8")));
        assert_eq!(metadata.get("steamAppId"), Some(&json!("480")));
    }
}
