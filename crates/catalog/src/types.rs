//! Provider-agnostic catalog entry.

use serde::{Deserialize, Serialize};

/// A game descriptor, translated from each provider's native product record
/// before aggregation.
///
/// The trailing fields (`installed`, `downloading`, `progress`,
/// `install_date`) are enrichment state filled in by the library store; raw
/// provider entries leave them at their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Human-readable size, e.g. `"1.5GB"`.
    #[serde(default)]
    pub size: String,
    /// Raw size in bytes as reported by the provider.
    #[serde(default)]
    pub expected_size: u64,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub age_rating: String,
    #[serde(default)]
    pub work_type: String,
    #[serde(default)]
    pub release_date: String,
    /// Source provider tag, e.g. `"hikari"` or `"dlsite"`.
    pub platform: String,

    #[serde(default)]
    pub installed: bool,
    #[serde(default)]
    pub downloading: bool,
    #[serde(default)]
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_date: Option<String>,
}

impl CatalogEntry {
    /// Minimal entry with the given id, name and provider tag.
    pub fn new(id: impl Into<String>, name: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            developer: String::new(),
            description: String::new(),
            thumbnail: String::new(),
            tags: Vec::new(),
            size: String::new(),
            expected_size: 0,
            price: 0,
            age_rating: String::new(),
            work_type: String::new(),
            release_date: String::new(),
            platform: platform.into(),
            installed: false,
            downloading: false,
            progress: 0.0,
            install_date: None,
        }
    }
}

/// Renders a byte count as a short human-readable string.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".into();
    }

    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let exp = ((bytes as f64).log(1024.0).floor() as usize).min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    format!("{value:.1}{}", UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_zero() {
        assert_eq!(format_size(0), "0B");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512.0B");
        assert_eq!(format_size(1024), "1.0KB");
        assert_eq!(format_size(1_572_864), "1.5MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0GB");
    }

    #[test]
    fn entry_serializes_camel_case() {
        let mut entry = CatalogEntry::new("g1", "Game", "dlsite");
        entry.expected_size = 1024;
        entry.install_date = Some("2026-01-01".into());

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["expectedSize"], 1024);
        assert_eq!(value["installDate"], "2026-01-01");
        assert_eq!(value["platform"], "dlsite");
    }

    #[test]
    fn entry_parses_with_missing_enrichment_fields() {
        let entry: CatalogEntry = serde_json::from_str(
            r#"{ "id": "g1", "name": "Game", "platform": "hikari" }"#,
        )
        .unwrap();
        assert!(!entry.installed);
        assert!(!entry.downloading);
        assert_eq!(entry.progress, 0.0);
    }
}
