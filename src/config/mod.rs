mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::path::{Path, PathBuf};
use tracing::debug;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            api: ApiConfig::default(),
            session_file: default_session_file(),
            tui: TuiSettings::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("Config {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::InvalidBaseUrl {
                url: self.api.base_url.clone(),
                reason: e.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.api.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.api.timeout_sec == 0 {
            return Err(ConfigError::ZeroValue {
                field: "api.timeout_sec",
            });
        }
        if self.tui.id_preview_chars == 0 {
            return Err(ConfigError::ZeroValue {
                field: "tui.id_preview_chars",
            });
        }

        Ok(())
    }

    pub fn log_file(&self) -> PathBuf {
        self.tui.log_file.clone().unwrap_or_else(default_log_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str(
            "api:\n  base_url: https://plan.example.com\ntui:\n  refresh_ms: 0\n",
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://plan.example.com");
        assert_eq!(config.api.timeout_sec, 15);
        assert_eq!(config.tui.refresh_ms, 0);
        assert_eq!(config.tui.id_preview_chars, 18);
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let mut config = Config::default();
        config.api.base_url = "ftp://plan.example.com".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = Config::default();
        config.api.timeout_sec = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroValue { field: "api.timeout_sec" })
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_or_default(Path::new("/nonexistent/planctl.yaml")).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
    }
}
