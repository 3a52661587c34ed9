//! Command handlers for the slidecache CLI.
//!
//! Each submodule handles one subcommand. Dispatch stays in main.rs.

pub mod clear;
pub mod completions;
pub mod config;
pub mod evict;
pub mod show;
pub mod status;
pub mod warm;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use slidecache::{CacheStore, Config};

/// Load the config from `--config` if given, else the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Resolve the config file path honoring `--config`.
pub fn config_file(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_path(),
    }
}

/// Open the configured cache directory and restore its metadata.
pub fn open_store(config: &Config) -> Result<CacheStore> {
    let dir = config.cache_directory();
    CacheStore::open(&dir, config.cache.jpeg_quality)
        .with_context(|| format!("Failed to open cache directory: {:?}", dir))
}
