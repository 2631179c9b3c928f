use std::path::PathBuf;

pub fn default_version() -> u32 {
    1
}

pub fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

pub fn default_timeout_sec() -> u64 {
    15
}

pub fn default_session_file() -> PathBuf {
    session_dir().join("session.json")
}

pub fn default_log_file() -> PathBuf {
    session_dir().join("planctl.log")
}

pub fn default_refresh_ms() -> u64 {
    5000
}

pub fn default_id_preview_chars() -> usize {
    18
}

fn session_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".planctl"),
        None => PathBuf::from(".planctl"),
    }
}
