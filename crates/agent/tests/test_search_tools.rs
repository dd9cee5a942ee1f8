//! Glob and grep tools against a real temp tree.

use quill_agent::tools::{GlobTool, GrepTool, ToolHandler};
use serde_json::json;
use tempfile::TempDir;

fn make_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src/tools")).unwrap();
    std::fs::create_dir_all(dir.path().join(".git")).unwrap();
    std::fs::write(dir.path().join("src/main.rs"), "fn main() {\n    run();\n}\n").unwrap();
    std::fs::write(
        dir.path().join("src/tools/mod.rs"),
        "pub fn run() {}\npub fn walk() {}\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("README.md"), "# readme\nrun the thing\n").unwrap();
    std::fs::write(dir.path().join(".git/config"), "run = hidden\n").unwrap();
    dir
}

#[tokio::test]
async fn glob_finds_rust_files() {
    let dir = make_tree();
    let glob = GlobTool::new(dir.path().to_path_buf());

    let output = glob.execute(json!({"pattern": "**/*.rs"})).await.unwrap();
    assert!(output.contains("src/main.rs"));
    assert!(output.contains("src/tools/mod.rs"));
    assert!(!output.contains("README.md"));
}

#[tokio::test]
async fn glob_single_segment_star() {
    let dir = make_tree();
    let glob = GlobTool::new(dir.path().to_path_buf());

    let output = glob.execute(json!({"pattern": "src/*.rs"})).await.unwrap();
    assert!(output.contains("src/main.rs"));
    assert!(!output.contains("src/tools/mod.rs"));
}

#[tokio::test]
async fn glob_no_matches_message() {
    let dir = make_tree();
    let glob = GlobTool::new(dir.path().to_path_buf());

    let output = glob.execute(json!({"pattern": "**/*.py"})).await.unwrap();
    assert!(output.contains("No files match"));
}

#[tokio::test]
async fn grep_reports_file_line_and_text() {
    let dir = make_tree();
    let grep = GrepTool::new(dir.path().to_path_buf());

    let output = grep.execute(json!({"pattern": r"fn \w+"})).await.unwrap();
    assert!(output.contains("src/main.rs:1: fn main() {"));
    assert!(output.contains("src/tools/mod.rs:1: pub fn run() {}"));
}

#[tokio::test]
async fn grep_skips_dot_directories() {
    let dir = make_tree();
    let grep = GrepTool::new(dir.path().to_path_buf());

    let output = grep.execute(json!({"pattern": "run"})).await.unwrap();
    assert!(!output.contains(".git"));
}

#[tokio::test]
async fn grep_case_insensitive_flag() {
    let dir = make_tree();
    let grep = GrepTool::new(dir.path().to_path_buf());

    let output = grep
        .execute(json!({"pattern": "Readme", "case_insensitive": false}))
        .await
        .unwrap();
    assert!(output.contains("No matches"));

    let output = grep
        .execute(json!({"pattern": "Readme", "case_insensitive": true}))
        .await
        .unwrap();
    assert!(output.contains("README.md:1"));
}

#[tokio::test]
async fn grep_invalid_regex_is_an_error() {
    let dir = make_tree();
    let grep = GrepTool::new(dir.path().to_path_buf());

    let result = grep.execute(json!({"pattern": "([unclosed"})).await;
    assert!(result.is_err());
}
