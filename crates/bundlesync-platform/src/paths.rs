use dirs::data_dir;
use std::path::PathBuf;

/// ~/.local/share/bundlesync   (or platform-equivalent)
pub fn bundlesync_home() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("bundlesync")
}

/// ~/.local/share/bundlesync/bundles
pub fn bundles_dir() -> PathBuf {
    bundlesync_home().join("bundles")
}
