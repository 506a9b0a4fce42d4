//! Settings file and environment configuration.
//!
//! `config.toml` in the app root holds run settings; the reasoning service is
//! configured through `OPENAI_*` environment variables, optionally seeded from
//! a `.env` file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;

/// Default filename of the settings file inside the app root.
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "OPENAI_CHAT_MODEL";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Errors raised while loading configuration, before any comparison runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The app root could not be resolved or created.
    #[error("Unable to resolve config directory: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
    /// The settings file exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The settings file is not valid TOML for [`AppSettings`].
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A parsed setting has an unusable value.
    #[error("Invalid setting `{key}`: {message}")]
    InvalidSetting { key: &'static str, message: String },
    /// A required variable is unset or blank.
    #[error("Missing required environment variable {0}")]
    MissingEnv(&'static str),
    /// A `.env` file was found but could not be parsed.
    #[error("Failed to load .env file: {0}")]
    Dotenv(#[source] dotenvy::Error),
}

/// Run settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Directory under which session directories are created.
    pub output_root: PathBuf,
    /// Connect/read/write timeout applied to reasoning requests.
    pub request_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("temp"),
            request_timeout_secs: 120,
        }
    }
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "request_timeout_secs",
                message: "must be at least 1 second".to_string(),
            });
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "output_root",
                message: "must not be empty".to_string(),
            });
        }
        Ok(self)
    }
}

/// Resolve the settings file path inside the app root.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load settings from the app root, falling back to defaults when the file
/// does not exist.
pub fn load_settings() -> Result<AppSettings, ConfigError> {
    load_settings_from(&config_path()?)
}

pub fn load_settings_from(path: &Path) -> Result<AppSettings, ConfigError> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: AppSettings = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    settings.validate()
}

/// Load `.env` from the working directory or its parents. A missing file is
/// not an error; returns the path that was loaded.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(ConfigError::Dotenv(err)),
    }
}

/// Credentials and endpoint of the chat completions service.
#[derive(Clone, PartialEq, Eq)]
pub struct ReasoningConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl ReasoningConfig {
    /// Read `OPENAI_API_KEY`, `OPENAI_CHAT_MODEL` and `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let api_key = get(API_KEY_ENV).ok_or(ConfigError::MissingEnv(API_KEY_ENV))?;
        let model = get(MODEL_ENV).ok_or(ConfigError::MissingEnv(MODEL_ENV))?;
        let base_url = get(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            api_key,
            model,
            base_url,
        })
    }
}

impl fmt::Debug for ReasoningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasoningConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
