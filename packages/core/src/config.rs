//! Engine configuration
//!
//! `EngineConfig` is loaded once at startup from a JSON file. Every field has
//! a serde default so older or partial files keep working; a missing file
//! yields the defaults. `PAGETREE_DATA_DIR` overrides the data directory.

use crate::db::JsonFileStore;
use crate::services::StaticSiteRegistry;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`EngineConfig::data_dir`]
pub const DATA_DIR_ENV: &str = "PAGETREE_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub id: String,
    /// Languages of the site; empty means `[default_language]`
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding page trees and view state
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_language: default_language(),
            sites: Vec::new(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_language() -> String {
    "en".to_string()
}

impl EngineConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut config = if tokio::fs::try_exists(path)
            .await
            .with_context(|| format!("Failed to check config file {}", path.display()))?
        {
            let contents = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Self::from_json(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Self::default()
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        Ok(config)
    }

    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Registry of the configured sites and their languages
    pub fn site_registry(&self) -> StaticSiteRegistry {
        self.sites
            .iter()
            .fold(StaticSiteRegistry::new(), |registry, site| {
                if site.languages.is_empty() {
                    registry.with_site(site.id.clone(), [self.default_language.clone()])
                } else {
                    registry.with_site(site.id.clone(), site.languages.clone())
                }
            })
    }

    /// File store rooted at the configured data directory
    pub fn file_store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SiteRegistry;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "sites": [ { "id": "example.com", "languages": ["en", "de"] }, { "id": "blog" } ] }"#,
        )
        .unwrap();

        assert_eq!(config.default_language, "en");
        assert_eq!(config.data_dir, PathBuf::from("./data"));

        let registry = config.site_registry();
        assert_eq!(
            registry.languages("example.com"),
            Some(vec!["en".to_string(), "de".to_string()])
        );
        assert_eq!(registry.languages("blog"), Some(vec!["en".to_string()]));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(EngineConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        let config = tokio_test::block_on(EngineConfig::load(&path)).unwrap();
        assert!(config.sites.is_empty());
    }
}
