//! Path validation for workspace-confined file operations.

use std::path::{Path, PathBuf};

/// A path escaped the workspace.
#[derive(Debug, Clone)]
pub struct PathValidationError {
    pub path: String,
    pub workspace: String,
}

impl std::fmt::Display for PathValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "path {} is outside workspace {}",
            self.path, self.workspace
        )
    }
}

impl std::error::Error for PathValidationError {}

/// Validate that a path stays inside the workspace.
///
/// Relative paths are joined to the workspace root, `~/` expands to home,
/// and existing paths are canonicalized so symlinks can't escape. Returns
/// the absolute path or an error if it lands outside the workspace.
pub async fn validate_workspace_path(
    path: &str,
    workspace_root: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error + Send + Sync>> {
    let expanded = if !path.starts_with('/') && !path.starts_with('~') {
        workspace_root.join(path)
    } else {
        expand_tilde(path)
    };

    let absolute = if expanded.exists() {
        match tokio::fs::canonicalize(&expanded).await {
            Ok(p) => p,
            Err(_) => std::env::current_dir()?.join(&expanded),
        }
    } else {
        // Canonicalize the nearest existing parent so `..` segments resolve
        let parent = expanded.parent().filter(|p| !p.as_os_str().is_empty());
        let file_name = expanded.file_name();

        if let Some(parent) = parent {
            let canonical_parent = if parent.exists() {
                tokio::fs::canonicalize(parent)
                    .await
                    .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default().join(parent))
            } else {
                std::env::current_dir()?.join(parent)
            };

            if let Some(file_name) = file_name {
                canonical_parent.join(file_name)
            } else {
                canonical_parent
            }
        } else {
            std::env::current_dir()?.join(&expanded)
        }
    };

    let canonical_workspace = if workspace_root.exists() {
        tokio::fs::canonicalize(workspace_root)
            .await
            .unwrap_or_else(|_| workspace_root.to_path_buf())
    } else {
        workspace_root.to_path_buf()
    };

    if !is_path_within(&absolute, &canonical_workspace) {
        return Err(Box::new(PathValidationError {
            path: path.to_string(),
            workspace: canonical_workspace.display().to_string(),
        }));
    }

    Ok(absolute)
}

fn is_path_within(path: &Path, workspace: &Path) -> bool {
    let path_components: Vec<_> = path.components().collect();
    let workspace_components: Vec<_> = workspace.components().collect();

    if path_components.len() < workspace_components.len() {
        return false;
    }

    workspace_components
        .iter()
        .enumerate()
        .all(|(i, comp)| path_components.get(i) == Some(comp))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
