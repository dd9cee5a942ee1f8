//! Filesystem tools against a real temp directory.

use quill_agent::tools::{
    EditFileTool, ListDirTool, ReadFileTool, ToolHandler, WriteFileTool,
};
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn write_then_read_roundtrip() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().to_path_buf();

    let write = WriteFileTool::new(workspace.clone());
    let output = write
        .execute(json!({"path": "notes/hello.txt", "content": "hello quill"}))
        .await
        .unwrap();
    assert!(output.contains("11 bytes"));

    let read = ReadFileTool::new(workspace);
    let content = read
        .execute(json!({"path": "notes/hello.txt"}))
        .await
        .unwrap();
    assert_eq!(content, "hello quill");
}

#[tokio::test]
async fn read_line_range() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().to_path_buf();
    std::fs::write(dir.path().join("lines.txt"), "one\ntwo\nthree\nfour\n").unwrap();

    let read = ReadFileTool::new(workspace);
    let content = read
        .execute(json!({"path": "lines.txt", "start_line": 2, "end_line": 3}))
        .await
        .unwrap();
    assert_eq!(content, "two\nthree");
}

#[tokio::test]
async fn read_missing_file_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let read = ReadFileTool::new(dir.path().to_path_buf());
    let output = read.execute(json!({"path": "ghost.txt"})).await.unwrap();
    assert!(output.contains("No file at"));
}

#[tokio::test]
async fn edit_replaces_unique_match() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().to_path_buf();
    std::fs::write(dir.path().join("code.rs"), "fn old_name() {}\n").unwrap();

    let edit = EditFileTool::new(workspace.clone());
    let output = edit
        .execute(json!({"path": "code.rs", "old_text": "old_name", "new_text": "new_name"}))
        .await
        .unwrap();
    assert!(output.contains("Edited"));

    let content = std::fs::read_to_string(dir.path().join("code.rs")).unwrap();
    assert_eq!(content, "fn new_name() {}\n");
}

#[tokio::test]
async fn edit_rejects_ambiguous_match() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("dup.txt"), "aaa aaa\n").unwrap();

    let edit = EditFileTool::new(dir.path().to_path_buf());
    let output = edit
        .execute(json!({"path": "dup.txt", "old_text": "aaa", "new_text": "bbb"}))
        .await
        .unwrap();
    assert!(output.contains("ambiguous"));

    // File untouched
    let content = std::fs::read_to_string(dir.path().join("dup.txt")).unwrap();
    assert_eq!(content, "aaa aaa\n");
}

#[tokio::test]
async fn list_dir_marks_entries() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("a.txt"), "x").unwrap();

    let list = ListDirTool::new(dir.path().to_path_buf());
    let output = list.execute(json!({"path": "."})).await.unwrap();
    assert!(output.contains("[file] a.txt"));
    assert!(output.contains("[dir]  sub"));
}

#[tokio::test]
async fn paths_outside_workspace_are_rejected() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join("ws");
    std::fs::create_dir(&workspace).unwrap();
    std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();

    let read = ReadFileTool::new(workspace.clone());
    let result = read.execute(json!({"path": "../secret.txt"})).await;
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("outside workspace"));

    let write = WriteFileTool::new(workspace);
    let result = write
        .execute(json!({"path": "/etc/quill_test", "content": "x"}))
        .await;
    assert!(result.is_err());
}
