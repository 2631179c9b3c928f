use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub api: ApiConfig,

    /// Where the login token is kept between runs
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    #[serde(default)]
    pub tui: TuiSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ApiConfig {
    /// Backend root, e.g. http://localhost:8080
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_sec: default_timeout_sec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TuiSettings {
    /// Background refresh of all views, in milliseconds (0 disables)
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,

    /// How many characters of long ids the detail panel shows
    #[serde(default = "default_id_preview_chars")]
    pub id_preview_chars: usize,

    /// Log file used while the TUI owns the terminal
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for TuiSettings {
    fn default() -> Self {
        Self {
            refresh_ms: default_refresh_ms(),
            id_preview_chars: default_id_preview_chars(),
            log_file: None,
        }
    }
}
