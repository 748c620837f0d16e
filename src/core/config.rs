//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default service location when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// spoolr configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the inventory service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// HTTP timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (resolved in the accessors)

        // 2. Global user config (~/.config/spoolr/config.yaml)
        if let Some(path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&path) {
                config.merge(global);
            }
        }

        // 3. Environment variables
        config.merge(Self::from_env(|key| std::env::var(key).ok()));

        config
    }

    fn read_file(path: &std::path::Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    fn from_env(var: impl Fn(&str) -> Option<String>) -> Config {
        Config {
            api_url: var("SPOOLR_API_URL").filter(|s| !s.trim().is_empty()),
            timeout_secs: var("SPOOLR_TIMEOUT").and_then(|s| s.trim().parse().ok()),
            default_format: None,
        }
    }

    /// Get the path to the global config file
    ///
    /// `SPOOLR_CONFIG` points somewhere else entirely.
    pub fn global_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SPOOLR_CONFIG") {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        directories::ProjectDirs::from("", "", "spoolr")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.api_url.is_some() {
            self.api_url = other.api_url;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Service base URL; an explicit `--api-url` beats every other layer
    pub fn api_url(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url(None), "http://localhost:8000");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_flag_beats_file_and_env() {
        let mut config = Config {
            api_url: Some("http://file:8000".to_string()),
            ..Default::default()
        };
        config.merge(Config::from_env(|key| {
            (key == "SPOOLR_API_URL").then(|| "http://env:8000".to_string())
        }));
        assert_eq!(config.api_url(None), "http://env:8000");
        assert_eq!(
            config.api_url(Some("http://flag:9000")),
            "http://flag:9000"
        );
    }

    #[test]
    fn test_env_ignores_bad_timeout() {
        let env = Config::from_env(|key| match key {
            "SPOOLR_TIMEOUT" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(env.timeout_secs, None);
        assert_eq!(env.api_url, None);
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut config = Config {
            api_url: Some("http://a".to_string()),
            timeout_secs: Some(5),
            default_format: Some("json".to_string()),
        };
        config.merge(Config {
            timeout_secs: Some(60),
            ..Default::default()
        });
        assert_eq!(config.api_url.as_deref(), Some("http://a"));
        assert_eq!(config.timeout_secs, Some(60));
        assert_eq!(config.default_format.as_deref(), Some("json"));
    }

    #[test]
    fn test_yaml_round_trip_skips_unset() {
        let config = Config {
            api_url: Some("http://nas.local:8000".to_string()),
            ..Default::default()
        };
        let yaml = serde_yml::to_string(&config).unwrap();
        assert!(yaml.contains("api_url"));
        assert!(!yaml.contains("timeout_secs"));
        let back: Config = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(back, config);
    }
}
