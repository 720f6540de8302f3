//! Configuration system for Prism.
//!
//! TOML-based configuration with:
//! - A single user config file (`~/.config/prism/config.toml`)
//! - Environment-variable overrides (`GEMINI_API_KEY`, `PRISM_STORE_PATH`,
//!   `PRISM_CONFIG_DIR`)
//! - API-key resolution (env var → config file)
//!
//! A missing config file is equivalent to the defaults; a missing API key is
//! an error only once something actually needs to call the API.

pub mod error;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use error::{ConfigError, Result};

/// Config filename within the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "prism";

/// Environment variable carrying the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the record store path.
pub const STORE_PATH_ENV: &str = "PRISM_STORE_PATH";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "PRISM_CONFIG_DIR";

// ─────────────────────────────────────────────────────────────────────────────
// Config Types
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level Prism configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismConfig {
    /// API key for the Gemini API. Prefer the `GEMINI_API_KEY` env var;
    /// this field exists for setups without one.
    pub api_key: Option<String>,

    /// Path of the record store file. Default: `<config dir>/records.json`,
    /// overridable with `PRISM_STORE_PATH`.
    pub store_path: Option<PathBuf>,

    /// Model selection.
    pub models: ModelsConfig,

    /// Video generation polling behavior.
    pub video: VideoConfig,
}

/// Model names for each capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Chat completion model.
    pub chat: String,
    /// Image generation model.
    pub image: String,
    /// Speech synthesis model.
    pub speech: String,
    /// Video generation model.
    pub video: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            chat: "gemini-3-flash-preview".to_string(),
            image: "gemini-2.5-flash-image".to_string(),
            speech: "gemini-2.5-flash-preview-tts".to_string(),
            video: "veo-3.1-fast-generate-preview".to_string(),
        }
    }
}

/// Polling behavior for long-running video generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Fixed delay between polls, in seconds. No backoff.
    pub poll_interval_secs: u64,
    /// Maximum number of polls before giving up. `None` polls forever.
    pub max_polls: Option<u32>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            max_polls: Some(240),
        }
    }
}

impl PrismConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Serialize the config to TOML text.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolve the API key: environment variable first, then config file.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            return Ok(key);
        }
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::ApiKeyNotFound)
    }

    /// Resolve the record store path.
    ///
    /// Resolution order: `PRISM_STORE_PATH` env var, configured `store_path`,
    /// `<config dir>/records.json`.
    pub fn resolve_store_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var(STORE_PATH_ENV) {
            return PathBuf::from(path);
        }
        self.store_path
            .clone()
            .unwrap_or_else(|| config_dir().join("records.json"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Discovery
// ─────────────────────────────────────────────────────────────────────────────

/// The Prism config directory.
///
/// `PRISM_CONFIG_DIR` overrides the platform default
/// (`~/.config/prism` on Linux).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the user config file.
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Load the user config, treating a missing file as the defaults.
pub fn load_config() -> Result<PrismConfig> {
    load_config_from(&config_path())
}

/// Load a config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<PrismConfig> {
    match std::fs::read_to_string(path) {
        Ok(contents) => PrismConfig::from_toml(&contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PrismConfig::default()),
        Err(e) => Err(ConfigError::ReadFile {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

/// Save a config, creating parent directories as needed.
pub fn save_config_to(config: &PrismConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: path.display().to_string(),
            source: e,
        })?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_models() {
        let config = PrismConfig::default();
        assert_eq!(config.models.chat, "gemini-3-flash-preview");
        assert_eq!(config.models.image, "gemini-2.5-flash-image");
        assert_eq!(config.models.speech, "gemini-2.5-flash-preview-tts");
        assert_eq!(config.models.video, "veo-3.1-fast-generate-preview");
        assert_eq!(config.video.poll_interval_secs, 10);
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config = PrismConfig::from_toml(
            r#"
            api_key = "test-key"

            [models]
            chat = "gemini-custom"
            "#,
        )
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.models.chat, "gemini-custom");
        assert_eq!(config.models.image, "gemini-2.5-flash-image");
    }

    #[test]
    fn missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("nope.toml")).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub/config.toml");

        let mut config = PrismConfig::default();
        config.api_key = Some("abc".to_string());
        config.video.max_polls = None;
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("abc"));
        assert_eq!(loaded.video.max_polls, None);
    }

    #[test]
    fn resolve_api_key_prefers_config_when_env_unset() {
        // Note: avoids mutating process env; assumes GEMINI_API_KEY is unset
        // in the test environment or this test is run in isolation.
        let mut config = PrismConfig::default();
        config.api_key = Some("from-file".to_string());
        if std::env::var(API_KEY_ENV).is_err() {
            assert_eq!(config.resolve_api_key().unwrap(), "from-file");
        }
    }

    #[test]
    fn resolve_api_key_missing_is_error() {
        let config = PrismConfig::default();
        if std::env::var(API_KEY_ENV).is_err() {
            assert!(matches!(
                config.resolve_api_key(),
                Err(ConfigError::ApiKeyNotFound)
            ));
        }
    }

    #[test]
    fn store_path_defaults_under_config_dir() {
        let config = PrismConfig::default();
        if std::env::var(STORE_PATH_ENV).is_err() {
            assert!(config.resolve_store_path().ends_with("records.json"));
        }
    }
}
