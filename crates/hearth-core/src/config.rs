use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "hearth";

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Where the saved-accounts file and other user settings live.
    pub config_dir: PathBuf,
    /// Scratch space for downloaded media.
    pub cache_dir: PathBuf,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(config_dir: P, cache_dir: Q) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME);
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME);
        Self {
            config_dir,
            cache_dir,
        }
    }
}
