use std::path::{Path, PathBuf};

/// Per-project state directory
pub const STATE_DIR_NAME: &str = ".codeqa";
pub const INDEX_FILE_NAME: &str = "index.json";
pub const LOCK_FILE_NAME: &str = "index.lock";

#[must_use]
pub fn state_dir_for_project_root(root: &Path) -> PathBuf {
    root.join(STATE_DIR_NAME)
}

#[must_use]
pub fn index_path_for_project_root(root: &Path) -> PathBuf {
    state_dir_for_project_root(root).join(INDEX_FILE_NAME)
}

#[must_use]
pub fn lock_path_for_project_root(root: &Path) -> PathBuf {
    state_dir_for_project_root(root).join(LOCK_FILE_NAME)
}
