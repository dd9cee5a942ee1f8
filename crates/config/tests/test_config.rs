//! Config load/save round-trips through temp files.

use quill_config::Config;
use tempfile::TempDir;

#[tokio::test]
async fn load_missing_file_returns_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let config = Config::load_from(&path).await.unwrap();
    assert_eq!(config.agent.model, "gpt-4o");
    assert!(config.provider.api_key.is_empty());
}

#[tokio::test]
async fn save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.provider.api_key = "sk-test123".to_string();
    config.agent.model = "gpt-4o-mini".to_string();
    config.tools.auto_approve = false;
    config.save_to(&path).await.unwrap();

    let loaded = Config::load_from(&path).await.unwrap();
    assert_eq!(loaded.provider.api_key, "sk-test123");
    assert_eq!(loaded.agent.model, "gpt-4o-mini");
    assert!(!loaded.tools.auto_approve);
}

#[tokio::test]
async fn load_malformed_json_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    tokio::fs::write(&path, "{not json").await.unwrap();

    assert!(Config::load_from(&path).await.is_err());
}

#[tokio::test]
async fn workspace_defaults_to_cwd() {
    let config = Config::default();
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(config.workspace_path(), cwd);
}
