//! Application configuration.
//!
//! Configuration is stored in `config.yaml` under the platform config
//! directory (or a path given with `--config`) and includes:
//! - Page size and search debounce for both collections
//! - The navigation link prefix
//! - Per-collection labels and search fields for the in-memory gateway

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RelatedListsError, Result};
use crate::types::CollectionKind;

pub const PAGE_SIZE_ENV: &str = "RELATED_LISTS_PAGE_SIZE";
pub const DEBOUNCE_ENV: &str = "RELATED_LISTS_DEBOUNCE_MS";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Rows requested per paginated fetch (default: 50)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Quiet period before a typed search is sent, in milliseconds (default: 300)
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Prefix prepended to a row id to build its navigation link (default: "/")
    #[serde(default = "default_link_prefix")]
    pub link_prefix: String,

    /// Artificial per-call delay of the in-memory gateway, in milliseconds (default: 0)
    #[serde(default)]
    pub simulated_latency_ms: u64,

    #[serde(default = "CollectionConfig::contacts")]
    pub contacts: CollectionConfig,

    #[serde(default = "CollectionConfig::opportunities")]
    pub opportunities: CollectionConfig,
}

fn default_page_size() -> usize {
    50
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_link_prefix() -> String {
    "/".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
            link_prefix: default_link_prefix(),
            simulated_latency_ms: 0,
            contacts: CollectionConfig::contacts(),
            opportunities: CollectionConfig::opportunities(),
        }
    }
}

/// Per-collection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Heading shown above the collection
    pub label: String,
    /// Fields matched by substring search
    pub search_fields: Vec<String>,
}

impl CollectionConfig {
    pub fn contacts() -> Self {
        Self {
            label: "Contacts".to_string(),
            search_fields: ["name", "email", "phone", "title"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    pub fn opportunities() -> Self {
        Self {
            label: "Opportunities".to_string(),
            search_fields: ["name", "stage_name", "type"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    /// Default config file location under the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "related-lists", "related-lists")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Load configuration from `path` (or the default location), apply env
    /// overrides, and validate. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match path {
            Some(ref p) if p.exists() => {
                let content = fs::read_to_string(p).map_err(|e| {
                    RelatedListsError::Io(std::io::Error::new(
                        e.kind(),
                        format!("Failed to read config at {}: {}", p.display(), e),
                    ))
                })?;
                Self::from_yaml(&content)?
            }
            _ => Config::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml_ng::from_str(content)?;
        Ok(config)
    }

    /// Environment variables take precedence over the file
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = env::var(PAGE_SIZE_ENV)
            && !value.is_empty()
        {
            self.page_size = value.parse().map_err(|_| {
                RelatedListsError::Config(format!("{PAGE_SIZE_ENV} must be a number, got '{value}'"))
            })?;
        }

        if let Ok(value) = env::var(DEBOUNCE_ENV)
            && !value.is_empty()
        {
            self.search_debounce_ms = value.parse().map_err(|_| {
                RelatedListsError::Config(format!("{DEBOUNCE_ENV} must be a number, got '{value}'"))
            })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(RelatedListsError::Config(
                "page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn collection(&self, kind: CollectionKind) -> &CollectionConfig {
        match kind {
            CollectionKind::Contacts => &self.contacts,
            CollectionKind::Opportunities => &self.opportunities,
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert_eq!(config.link_prefix, "/");
        assert_eq!(config.contacts.label, "Contacts");
        assert!(config.opportunities.search_fields.contains(&"stage_name".to_string()));
    }

    #[test]
    fn test_config_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("page_size: 20\n").unwrap();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.search_debounce_ms, 300);
        assert_eq!(config.contacts, CollectionConfig::contacts());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.page_size = 10;
        config.contacts.search_fields = vec!["name".to_string()];

        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();

        assert_eq!(parsed.page_size, 10);
        assert_eq!(parsed.contacts.search_fields, vec!["name".to_string()]);
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let config = Config::from_yaml("page_size: 0\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(RelatedListsError::Config(_))
        ));
    }

    #[test]
    #[serial]
    fn test_load_missing_file_returns_default() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::load(Some(&tmp.path().join("absent.yaml"))).unwrap();
        assert_eq!(config.page_size, 50);
    }

    #[test]
    #[serial]
    fn test_load_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "page_size: 25\nlink_prefix: /lightning/r/\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.link_prefix, "/lightning/r/");
    }

    #[test]
    #[serial]
    fn test_env_override_takes_precedence() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "page_size: 25\n").unwrap();

        unsafe { env::set_var(PAGE_SIZE_ENV, "7") };
        let config = Config::load(Some(&path));
        unsafe { env::remove_var(PAGE_SIZE_ENV) };

        assert_eq!(config.unwrap().page_size, 7);
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_garbage() {
        unsafe { env::set_var(DEBOUNCE_ENV, "soon") };
        let result = Config::load(Some(Path::new("/nonexistent/config.yaml")));
        unsafe { env::remove_var(DEBOUNCE_ENV) };

        assert!(matches!(result, Err(RelatedListsError::Config(_))));
    }
}
