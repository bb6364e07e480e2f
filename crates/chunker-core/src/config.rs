//! Application configuration management.
//!
//! Configuration comes from two places: a JSON file at
//! `~/.config/chunker/config.json` (backend URL, token store, last used
//! username) and environment variables, which take precedence. The backend
//! URL is mandatory; [`Config::backend_url`] fails when it is missing so the
//! client can refuse to start instead of failing on the first request.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Application name used for config/data directory paths
const APP_NAME: &str = "chunker";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable naming the backend base endpoint
pub const BACKEND_URL_ENV: &str = "CHUNKER_BACKEND_URL";

/// Environment variable selecting the token store backend
pub const TOKEN_STORE_ENV: &str = "CHUNKER_TOKEN_STORE";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "CHUNKER_DATA_DIR";

/// Environment variable setting a request timeout in seconds
pub const REQUEST_TIMEOUT_ENV: &str = "CHUNKER_REQUEST_TIMEOUT_SECS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Backend URL not configured - set {BACKEND_URL_ENV}")]
    MissingBackendUrl,

    #[error("Invalid backend URL '{value}': {source}")]
    InvalidBackendUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported token store '{0}' (expected file, keyring or memory)")]
    UnknownTokenStore(String),

    #[error("Invalid request timeout '{0}'")]
    InvalidTimeout(String),

    #[error("Could not find {0} directory")]
    MissingDirectory(&'static str),
}

/// Where the bearer token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    /// A single file in the data directory
    #[default]
    File,
    /// The OS keychain
    Keyring,
    /// Process memory only (nothing survives a restart)
    Memory,
}

impl FromStr for TokenStoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::UnknownTokenStore(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub backend_url: Option<String>,
    #[serde(default)]
    pub token_store: TokenStoreKind,
    pub data_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub last_username: Option<String>,
}

impl Config {
    /// Load the config file (defaults if absent) and apply environment overrides.
    ///
    /// The result is a runtime view; it is never written back. Use
    /// [`Config::remember_username`] to persist file values.
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&Self::config_path()?)?;
        Ok(config.with_overrides(|key| std::env::var(key).ok())?)
    }

    /// Values stored in the file at `path` alone, without overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Record the last successful username in the config file.
    pub fn remember_username(username: &str) -> Result<()> {
        Self::remember_username_at(&Self::config_path()?, username)
    }

    /// Re-read the file, change only `last_username`, and write it back.
    fn remember_username_at(path: &Path, username: &str) -> Result<()> {
        let mut stored = Self::load_from(path)?;
        stored.last_username = Some(username.to_string());
        stored.save_to(path)
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(BACKEND_URL_ENV) {
            self.backend_url = Some(url);
        }
        if let Some(kind) = get(TOKEN_STORE_ENV) {
            self.token_store = kind.parse()?;
        }
        if let Some(dir) = get(DATA_DIR_ENV) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(secs) = get(REQUEST_TIMEOUT_ENV) {
            let parsed = secs
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(secs.clone()))?;
            self.request_timeout_secs = Some(parsed);
        }
        Ok(self)
    }

    /// The backend base endpoint, normalized to end with `/` so relative
    /// endpoint paths join underneath it.
    pub fn backend_url(&self) -> Result<Url, ConfigError> {
        let raw = self
            .backend_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingBackendUrl)?;

        let mut url = Url::parse(raw).map_err(|source| ConfigError::InvalidBackendUrl {
            value: raw.to_string(),
            source,
        })?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::MissingDirectory("config"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding durable client state (the token file).
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir().ok_or(ConfigError::MissingDirectory("data"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_backend_url_fails() {
        let config = Config::default();
        assert!(matches!(
            config.backend_url(),
            Err(ConfigError::MissingBackendUrl)
        ));

        let config = Config::default()
            .with_overrides(lookup(&[(BACKEND_URL_ENV, "   ")]))
            .unwrap();
        assert!(matches!(
            config.backend_url(),
            Err(ConfigError::MissingBackendUrl)
        ));
    }

    #[test]
    fn test_invalid_backend_url_fails() {
        let config = Config {
            backend_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.backend_url(),
            Err(ConfigError::InvalidBackendUrl { .. })
        ));
    }

    #[test]
    fn test_backend_url_gets_trailing_slash() {
        let config = Config {
            backend_url: Some("http://localhost:8000/api".to_string()),
            ..Default::default()
        };
        let url = config.backend_url().unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/");
        assert_eq!(
            url.join("auth/login").unwrap().as_str(),
            "http://localhost:8000/api/auth/login"
        );
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = Config {
            backend_url: Some("http://file-value".to_string()),
            last_username: Some("admin".to_string()),
            ..Default::default()
        }
        .with_overrides(lookup(&[
            (BACKEND_URL_ENV, "http://env-value:9000"),
            (TOKEN_STORE_ENV, "Keyring"),
            (REQUEST_TIMEOUT_ENV, "15"),
            (DATA_DIR_ENV, "/tmp/chunker-test"),
        ]))
        .unwrap();

        assert_eq!(config.backend_url.as_deref(), Some("http://env-value:9000"));
        assert_eq!(config.token_store, TokenStoreKind::Keyring);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(
            config.data_dir().unwrap(),
            PathBuf::from("/tmp/chunker-test")
        );
        // Untouched by the environment
        assert_eq!(config.last_username.as_deref(), Some("admin"));
    }

    #[test]
    fn test_bad_overrides_rejected() {
        assert!(matches!(
            Config::default().with_overrides(lookup(&[(TOKEN_STORE_ENV, "cookie")])),
            Err(ConfigError::UnknownTokenStore(_))
        ));
        assert!(matches!(
            Config::default().with_overrides(lookup(&[(REQUEST_TIMEOUT_ENV, "soon")])),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_remember_username_keeps_overrides_out_of_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chunker").join(CONFIG_FILE);
        Config {
            backend_url: Some("http://file-value:8000".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .unwrap();

        // Runtime view with overrides from the environment
        let runtime = Config::load_from(&path)
            .unwrap()
            .with_overrides(lookup(&[
                (BACKEND_URL_ENV, "http://staging:9000"),
                (TOKEN_STORE_ENV, "memory"),
                (REQUEST_TIMEOUT_ENV, "5"),
            ]))
            .unwrap();
        assert_eq!(runtime.token_store, TokenStoreKind::Memory);

        Config::remember_username_at(&path, "admin").unwrap();

        let stored = Config::load_from(&path).unwrap();
        assert_eq!(stored.backend_url.as_deref(), Some("http://file-value:8000"));
        assert_eq!(stored.token_store, TokenStoreKind::File);
        assert_eq!(stored.request_timeout_secs, None);
        assert_eq!(stored.last_username.as_deref(), Some("admin"));
    }

    #[test]
    fn test_remember_username_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        assert_eq!(Config::load_from(&path).unwrap().last_username, None);

        Config::remember_username_at(&path, "first").unwrap();
        Config::remember_username_at(&path, "second").unwrap();

        let stored = Config::load_from(&path).unwrap();
        assert_eq!(stored.last_username.as_deref(), Some("second"));
        assert_eq!(stored.backend_url, None);
    }

    #[test]
    fn test_parse_config_file() {
        let json = r#"{"backend_url": "http://localhost:8000", "token_store": "memory", "last_username": "admin"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.token_store, TokenStoreKind::Memory);
        assert_eq!(config.last_username.as_deref(), Some("admin"));
        assert!(config.request_timeout().is_none());

        // token_store defaults to file when omitted
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.token_store, TokenStoreKind::File);
    }
}
