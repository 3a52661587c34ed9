//! Status command handler

use anyhow::Result;
use std::path::Path;

use slidecache::CacheStats;

use super::{load_config, open_store};

/// Display thumbnail cache usage against the configured budget.
#[cfg(not(tarpaulin_include))]
pub fn handle(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let stats = CacheStats::collect(&store, config.cache.budget_bytes());
    println!("{}", stats.summary());
    Ok(())
}
