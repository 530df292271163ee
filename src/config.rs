//! Application configuration
//!
//! Read from `config.toml` in the user's config directory. Every field has a
//! default, so a missing file or a partial file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::concept_map::AutosaveSettings;
use crate::flashcards::DEFAULT_PRESETS;
use crate::keywords::DEFAULT_LIMIT;
use crate::storage::DEFAULT_ROOT;

const APP_DIR: &str = "mapmynotes";
const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Could not determine a {0} directory")]
    NoDirectory(&'static str),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Blobs in a directory under `data_dir`
    #[default]
    Local,
    Webdav,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: Backend,
    /// Server URL for the WebDAV backend
    pub url: Option<String>,
    /// Folder holding the app's blobs
    pub root: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Local,
            url: None,
            root: DEFAULT_ROOT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    pub debounce_ms: u64,
    pub interval_secs: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordsConfig {
    pub limit: usize,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Interval choices offered when a card is remembered, in days
    pub presets: Vec<u32>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            presets: DEFAULT_PRESETS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub command: String,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Local data directory; `None` means the platform default
    pub data_dir: Option<PathBuf>,
    pub store: StoreConfig,
    pub autosave: AutosaveConfig,
    pub keywords: KeywordsConfig,
    pub review: ReviewConfig,
    pub ocr: OcrConfig,
}

/// Default location of `config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoDirectory("config"))?;
    Ok(dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Default local data directory
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let dir = dirs::data_local_dir().ok_or(ConfigError::NoDirectory("data"))?;
    Ok(dir.join(APP_DIR))
}

impl AppConfig {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A file that does not exist yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("config: {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        let config = Self::parse(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.clone(),
                source,
            },
            other => other,
        })?;
        log::info!("config: loaded {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.autosave.debounce_ms == 0 {
            return Err(ConfigError::Invalid("autosave.debounce_ms must be positive".into()));
        }
        if self.autosave.interval_secs == 0 {
            return Err(ConfigError::Invalid("autosave.interval_secs must be positive".into()));
        }
        if self.review.presets.iter().any(|d| *d == 0) {
            return Err(ConfigError::Invalid("review.presets must be at least 1 day".into()));
        }
        Ok(())
    }

    /// The configured data directory, or the platform default
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    pub fn autosave_settings(&self) -> AutosaveSettings {
        AutosaveSettings {
            debounce: Duration::from_millis(self.autosave.debounce_ms),
            interval: Duration::from_secs(self.autosave.interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.store.root, "Map My Notes");
        assert_eq!(config.review.presets, vec![1, 3, 7]);
        assert_eq!(config.keywords.limit, 5);
        assert_eq!(config.autosave_settings(), AutosaveSettings::default());
    }

    #[test]
    fn test_partial_file() {
        let config = AppConfig::parse(
            r#"
            data_dir = "/tmp/mmn"

            [store]
            backend = "webdav"
            url = "https://dav.example.com"

            [review]
            presets = [2, 5]
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/mmn"));
        assert_eq!(config.store.backend, Backend::Webdav);
        assert_eq!(config.store.root, DEFAULT_ROOT);
        assert_eq!(config.review.presets, vec![2, 5]);
        assert_eq!(config.autosave.interval_secs, 60);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            AppConfig::parse("[autosave]\ndebounce_ms = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::parse("[store]\nbackend = \"ftp\""),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_missing_and_present() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        assert_eq!(AppConfig::load(Some(&path)).unwrap(), AppConfig::default());

        std::fs::write(&path, "[keywords]\nlimit = 8\n").unwrap();
        assert_eq!(AppConfig::load(Some(&path)).unwrap().keywords.limit, 8);
    }
}
