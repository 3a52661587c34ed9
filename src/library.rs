//! Source folder scanning
//!
//! Builds the ordered path list handed to the thumbnail worker. Positions in
//! the returned list are the indices the worker reports back.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::LibraryConfig;

/// Whether `path` has one of the configured image extensions.
pub fn is_image(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Collect image files under `folder`, sorted or shuffled per config.
///
/// A missing folder yields an empty list.
pub fn scan(folder: &Path, config: &LibraryConfig) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    if !folder.is_dir() {
        return Ok(paths);
    }

    collect(folder, config, &mut paths)?;

    if config.random_order {
        paths.shuffle(&mut rand::thread_rng());
    } else {
        paths.sort();
    }
    tracing::debug!(count = paths.len(), folder = %folder.display(), "library scanned");
    Ok(paths)
}

fn collect(dir: &Path, config: &LibraryConfig, paths: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))?;

    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if config.recursive {
                // Unreadable subdirectories are skipped, not fatal
                if let Err(e) = collect(&path, config, paths) {
                    tracing::debug!(error = %e, "skipping directory");
                }
            }
        } else if path.is_file() && is_image(&path, &config.extensions) {
            paths.push(path);
        }
    }
    Ok(())
}
