use std::path::PathBuf;
use thiserror::Error;

use crate::model::NodeId;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },
}

/// Failures talking to the planning backend
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server rejected the request ({status}){}", message_suffix(.message))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error("Not signed in or session expired; run `planctl login`")]
    Unauthorized,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("{0} is not supported yet")]
    NotImplemented(&'static str),
}

impl ApiError {
    /// Text to show the user: the backend's own message when it sent one
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Rejected { message: None, .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, ApiError::NotImplemented(_))
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to read session file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write session file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt session file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq)]
pub enum TreeError {
    #[error("Malformed hierarchy: parent references form a cycle through {}", format_ids(.node_ids))]
    MalformedHierarchy { node_ids: Vec<NodeId> },
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

fn format_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_backend_text() {
        let err = ApiError::Rejected {
            status: 409,
            message: Some("Node has children".to_string()),
        };
        assert_eq!(err.user_message("Delete failed"), "Node has children");
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = ApiError::Rejected {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message("Delete failed"), "Delete failed");
        assert_eq!(err.to_string(), "Server rejected the request (500)");
    }

    #[test]
    fn test_malformed_hierarchy_lists_ids() {
        let err = TreeError::MalformedHierarchy {
            node_ids: vec![NodeId::from("a"), NodeId::from("b")],
        };
        assert_eq!(
            err.to_string(),
            "Malformed hierarchy: parent references form a cycle through a, b"
        );
    }
}
