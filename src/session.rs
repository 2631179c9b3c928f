use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::SessionError;
use crate::model::AuthResponse;

/// Login token kept between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub email: String,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn from_login(email: &str, auth: AuthResponse) -> Self {
        Self {
            access_token: auth.access_token,
            token_type: auth.token_type,
            email: email.to_string(),
            logged_in_at: Utc::now(),
        }
    }

    /// Load the session at `path`; `None` when nobody is logged in
    pub fn load(path: &Path) -> Result<Option<Self>, SessionError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|source| SessionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Save session to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let write_err = |source| SessionError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(write_err)
    }

    /// Forget the session. Returns whether one existed.
    pub fn clear(path: &Path) -> Result<bool, SessionError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SessionError::Write {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
