use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BillingError, Result};

pub const API_URL_ENV: &str = "CLIENTBOOK_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_api_base_url() -> String {
    "https://client-app-blush.vercel.app".to_string()
}

fn default_items_per_page() -> usize {
    10
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            items_per_page: default_items_per_page(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl Settings {
    /// Update one field from its string form, as given to `config set`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_base_url" => {
                let url = value.trim().trim_end_matches('/');
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(BillingError::Settings(format!(
                        "api_base_url must start with http:// or https://, got '{value}'"
                    )));
                }
                self.api_base_url = url.to_string();
            }
            "items_per_page" => {
                let n: usize = value
                    .trim()
                    .parse()
                    .map_err(|_| BillingError::Settings(format!("items_per_page must be a number, got '{value}'")))?;
                if n == 0 {
                    return Err(BillingError::Settings("items_per_page must be at least 1".into()));
                }
                self.items_per_page = n;
            }
            "currency_symbol" => self.currency_symbol = value.to_string(),
            other => return Err(BillingError::Settings(format!("Unknown setting: {other}"))),
        }
        Ok(())
    }

    /// Apply the environment override for the API base URL.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                info!("{API_URL_ENV} set, using API at {url}");
                self.api_base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        self
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("clientbook")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|e| {
            debug!("Ignoring unreadable settings at {}: {e}", path.display());
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BillingError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

/// Stored settings, without the environment override.
pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

/// Effective settings for this run.
pub fn effective_settings() -> Settings {
    load_settings().with_env_overrides()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            api_base_url: "http://localhost:4000".to_string(),
            items_per_page: 25,
            currency_symbol: "\u{20b9}".to_string(),
        };
        save_settings_to(&path, &settings).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("nope.json"));
        assert_eq!(s, Settings::default());
        assert_eq!(s.items_per_page, 10);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"items_per_page": 5}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.items_per_page, 5);
        assert_eq!(s.api_base_url, default_api_base_url());
        assert_eq!(s.currency_symbol, "$");
    }

    #[test]
    fn test_load_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn test_save_creates_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("settings.json");
        save_settings_to(&path, &Settings::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_set_validates_values() {
        let mut s = Settings::default();
        s.set("items_per_page", "20").unwrap();
        assert_eq!(s.items_per_page, 20);
        assert!(s.set("items_per_page", "0").is_err());
        assert!(s.set("items_per_page", "many").is_err());
        s.set("api_base_url", "http://localhost:4000/").unwrap();
        assert_eq!(s.api_base_url, "http://localhost:4000");
        assert!(s.set("api_base_url", "localhost").is_err());
        assert!(s.set("colour", "blue").is_err());
    }
}
