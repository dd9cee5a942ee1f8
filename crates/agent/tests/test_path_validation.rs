//! Workspace path validation against real directories.

use quill_agent::tools::path_utils::validate_workspace_path;
use tempfile::TempDir;

#[tokio::test]
async fn existing_file_inside_workspace_is_accepted() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path();
    let file = workspace.join("test.txt");
    std::fs::write(&file, "content").unwrap();

    let result = validate_workspace_path(file.to_str().unwrap(), workspace).await;
    assert!(result.is_ok());
    assert_eq!(result.unwrap(), file.canonicalize().unwrap());
}

#[tokio::test]
async fn relative_paths_resolve_against_the_workspace() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path();
    std::fs::create_dir(workspace.join("sub")).unwrap();
    std::fs::write(workspace.join("sub/file.txt"), "x").unwrap();

    let result = validate_workspace_path("sub/file.txt", workspace).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn absolute_path_outside_workspace_is_rejected() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join("workspace");
    std::fs::create_dir(&workspace).unwrap();

    let outside = dir.path().join("outside.txt");
    std::fs::write(&outside, "content").unwrap();

    let result = validate_workspace_path(outside.to_str().unwrap(), &workspace).await;
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("outside workspace"));
}

#[tokio::test]
async fn dotdot_traversal_cannot_escape() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join("workspace");
    std::fs::create_dir(&workspace).unwrap();
    std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();

    let result = validate_workspace_path("../secret.txt", &workspace).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn nonexistent_path_inside_workspace_is_accepted() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path();

    let result =
        validate_workspace_path(workspace.join("new_file.txt").to_str().unwrap(), workspace).await;
    assert!(result.is_ok());
}
