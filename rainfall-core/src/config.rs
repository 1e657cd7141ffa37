use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::openweather::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_MODEL_PATH: &str = "models/rainfall_model.json";

/// Service configuration stored on disk, overridable from the environment.
///
/// Example TOML:
/// api_key = "..."
/// model_path = "models/rainfall_model.json"
/// bind = "127.0.0.1:5000"
/// timeout_secs = 10
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    pub model_path: Option<PathBuf>,

    /// Listen address, e.g. "0.0.0.0:8080".
    pub bind: Option<String>,

    /// Timeout for outbound weather requests, in seconds.
    pub timeout_secs: Option<u64>,

    /// Provider base URL; only set to point at a proxy or mock.
    pub base_url: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "rainfall", "rainfall")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from process environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| env::var(key).ok())
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("WEATHER_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(path) = var("RAINFALL_MODEL_PATH") {
            self.model_path = Some(PathBuf::from(path));
        }
        if let Some(bind) = var("RAINFALL_BIND") {
            self.bind = Some(bind);
        }
        if let Some(secs) = var("RAINFALL_TIMEOUT_SECS") {
            let secs = secs.trim().parse().with_context(|| {
                format!("RAINFALL_TIMEOUT_SECS must be a whole number, got '{secs}'")
            })?;
            self.timeout_secs = Some(secs);
        }
        if let Some(url) = var("OPENWEATHER_BASE_URL") {
            self.base_url = Some(url);
        }

        Ok(())
    }

    /// Returns the API key or an error with a hint on how to set one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: set WEATHER_API_KEY or run `rainfall configure`."
                )
            })
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
    }

    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::default();
        assert_eq!(cfg.bind(), DEFAULT_BIND);
        assert_eq!(cfg.model_path(), PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.base_url(), "http://api.openweathermap.org");
    }

    #[test]
    fn require_api_key_errors_with_hint() {
        let cfg = Config::default();
        let msg = cfg.require_api_key().unwrap_err().to_string();
        assert!(msg.contains("No OpenWeather API key configured"));
        assert!(msg.contains("rainfall configure"));

        let cfg = Config { api_key: Some(String::new()), ..Config::default() };
        assert!(cfg.require_api_key().is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config {
            api_key: Some("FILE_KEY".into()),
            bind: Some("0.0.0.0:80".into()),
            ..Config::default()
        };

        cfg.apply_vars(vars(&[
            ("WEATHER_API_KEY", "ENV_KEY"),
            ("RAINFALL_TIMEOUT_SECS", "3"),
            ("RAINFALL_MODEL_PATH", "/srv/model.json"),
        ]))
        .unwrap();

        assert_eq!(cfg.require_api_key().unwrap(), "ENV_KEY");
        assert_eq!(cfg.bind(), "0.0.0.0:80");
        assert_eq!(cfg.timeout(), Duration::from_secs(3));
        assert_eq!(cfg.model_path(), PathBuf::from("/srv/model.json"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = Config { api_key: Some("FILE_KEY".into()), ..Config::default() };
        cfg.apply_vars(vars(&[("WEATHER_API_KEY", "  ")])).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("FILE_KEY"));
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let mut cfg = Config::default();
        let err = cfg.apply_vars(vars(&[("RAINFALL_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("RAINFALL_TIMEOUT_SECS"));
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config {
            api_key: Some("KEY".into()),
            timeout_secs: Some(5),
            ..Config::default()
        };
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = \"ten\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
