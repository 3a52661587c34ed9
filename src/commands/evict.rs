//! Evict command handler

use anyhow::{Context, Result};
use std::path::Path;

use slidecache::cache::budget_bytes_from_mb;
use slidecache::Evictor;

use super::{load_config, open_store};

/// Run one eviction pass and save the updated metadata.
#[cfg(not(tarpaulin_include))]
pub fn handle(config_path: Option<&Path>, max_mb: Option<f64>) -> Result<()> {
    let config = load_config(config_path)?;
    let budget = max_mb
        .map(budget_bytes_from_mb)
        .unwrap_or_else(|| config.cache.budget_bytes());

    let store = open_store(&config)?;
    let report = Evictor::new(budget).run(&store);
    store.persist().context("Failed to save cache metadata")?;

    println!("{}", report.summary());
    for path in &report.failed {
        eprintln!("Could not delete thumbnail for {}", path.display());
    }
    Ok(())
}
