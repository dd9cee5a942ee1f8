//! Well-known filesystem locations.

use std::path::PathBuf;

/// Quill's data directory (~/.quill).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .expect("failed to locate home directory")
        .join(".quill")
}

/// Configuration file location.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Ensure a directory exists.
pub async fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}
