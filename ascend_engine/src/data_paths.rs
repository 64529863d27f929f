use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Environment variable that pins the data root explicitly.
pub const DATA_DIR_ENV: &str = "ASCEND_DATA_DIR";

/// Cached path to the directory holding config and player data.
static DATA_ROOT: LazyLock<PathBuf> = LazyLock::new(detect_data_root);

/// The resolved data root.
pub fn data_root() -> &'static Path {
    &DATA_ROOT
}

/// Directory holding `main.json`, `categories/`, `actions/` and the sidecars.
pub fn config_dir(root: &Path) -> PathBuf {
    root.join("config")
}

/// Directory holding one RON save per player.
pub fn player_data_dir(root: &Path) -> PathBuf {
    root.join("playerdata")
}

/// Resolve the most likely location of the runtime data directory.
fn detect_data_root() -> PathBuf {
    if let Ok(explicit) = env::var(DATA_DIR_ENV)
        && !explicit.trim().is_empty()
    {
        return PathBuf::from(explicit);
    }

    let mut candidates = vec![PathBuf::from("ascend_engine/data"), PathBuf::from("data")];

    if let Ok(exe_path) = env::current_exe()
        && let Some(dir) = exe_path.parent()
    {
        candidates.push(dir.join("ascend_engine/data"));
        candidates.push(dir.join("data"));

        if let Some(parent) = dir.parent() {
            candidates.push(parent.join("ascend_engine/data"));
            candidates.push(parent.join("data"));
        }
    }

    candidates
        .into_iter()
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| PathBuf::from("data"))
}
