//! Configuration management for slidecache
//!
//! The loaded `Config` is passed explicitly to whatever needs it; nothing
//! here is global.

mod io;
mod types;

pub use types::*;

use anyhow::Result;
use std::path::{Path, PathBuf};

impl Config {
    /// Get the config file path (~/.config/slidecache/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        io::config_path()
    }

    /// Get the config directory path (~/.config/slidecache)
    pub fn config_dir() -> Result<PathBuf> {
        io::config_dir()
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Result<Self> {
        io::load()
    }

    /// Load configuration from a specific file, or defaults if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        io::load_from(path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        io::save_to(self, path)
    }

    /// Expand ~ in the cache directory path
    pub fn cache_directory(&self) -> PathBuf {
        expand_home(&self.cache.directory)
    }

    /// Expand ~ in the library folder, `None` if unset
    pub fn library_folder(&self) -> Option<PathBuf> {
        if self.library.folder.trim().is_empty() {
            None
        } else {
            Some(expand_home(&self.library.folder))
        }
    }
}

fn expand_home(dir: &str) -> PathBuf {
    if let Some(stripped) = dir.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(dir)
}
