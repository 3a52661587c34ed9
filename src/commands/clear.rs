//! Clear command handler

use anyhow::{Context, Result};
use humansize::{format_size, BINARY};
use std::io::{self, BufRead, Write};
use std::path::Path;

use super::{load_config, open_store};

/// Delete every file in the cache directory.
///
/// Asks for confirmation unless `yes` is set.
#[cfg(not(tarpaulin_include))]
pub fn handle(config_path: Option<&Path>, yes: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    if !yes {
        print!(
            "Delete {} cached thumbnails ({}) in {}? [y/N] ",
            store.len(),
            format_size(store.total_size(), BINARY),
            store.dir().display()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        if !is_confirmation(&input) {
            println!("No changes made.");
            return Ok(());
        }
    }

    let removed = store.clear_all().context("Failed to clear cache")?;
    println!("Removed {} files from {}", removed, store.dir().display());
    Ok(())
}

fn is_confirmation(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
