use std::path::{Path, PathBuf};

use warden_store::layout::ORCHESTRATION_DIR;

/// Find the project root by walking up from `start`.
pub fn find_project_root(start: &Path) -> anyhow::Result<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(ORCHESTRATION_DIR).is_dir() {
            return Ok(dir);
        }
        if !dir.pop() {
            anyhow::bail!(
                "not in a governed project (no {ORCHESTRATION_DIR} directory found); run `warden init`"
            );
        }
    }
}

/// Explicit `--root` wins; otherwise search upward from the current directory.
pub fn resolve_root(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    match explicit {
        Some(root) if root.is_absolute() => Ok(root),
        Some(root) => Ok(cwd.join(root)),
        None => find_project_root(&cwd),
    }
}
