//! Warm command handler

use anyhow::{bail, Context, Result};
use humansize::{format_size, BINARY};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use slidecache::{library, ImagePipeline, PassStats, WorkerEvent};

use super::load_config;

/// How often the event loop checks for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Command-line overrides for a warm run.
#[derive(Debug, Default)]
pub struct WarmOptions {
    pub folder: Option<PathBuf>,
    pub recursive: bool,
    pub random: bool,
    pub page: usize,
    pub per_page: Option<usize>,
}

/// Scan a folder and run the thumbnail worker until one pass completes.
#[cfg(not(tarpaulin_include))]
pub fn handle(config_path: Option<&Path>, options: WarmOptions) -> Result<()> {
    let mut config = load_config(config_path)?;
    config.library.recursive |= options.recursive;
    config.library.random_order |= options.random;

    let folder = match options.folder {
        Some(folder) => folder,
        None => config
            .library_folder()
            .context("No folder given and library.folder is not set")?,
    };
    if !folder.is_dir() {
        bail!("Not a directory: {}", folder.display());
    }

    let paths = library::scan(&folder, &config.library)?;
    if paths.is_empty() {
        println!("No images found in {}", folder.display());
        return Ok(());
    }
    let total = paths.len();

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .ok(); // Ignore if handler already set

    let (pipeline, events, _images) =
        ImagePipeline::start(&config).context("Failed to start image pipeline")?;
    if let Some(per_page) = options.per_page {
        pipeline.show_page(options.page, per_page);
    }
    let revision = pipeline.set_paths(paths);

    println!("Warming {} images from {}", total, folder.display());

    let mut delivered = 0usize;
    let mut completed: Option<PassStats> = None;
    while completed.is_none() && !interrupted.load(Ordering::SeqCst) {
        match events.recv_timeout(POLL_INTERVAL) {
            Ok(WorkerEvent::Thumbnail(result)) if result.revision == revision => {
                delivered += 1;
            }
            Ok(WorkerEvent::PassComplete { revision: r, stats }) if r == revision => {
                completed = Some(stats);
            }
            Ok(_) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    match completed {
        Some(stats) => println!("{}", pass_summary(&stats)),
        None => println!("Interrupted after {} of {} thumbnails", delivered, total),
    }

    let stats = pipeline.stats();
    println!(
        "Cache size: {} ({} entries)",
        format_size(stats.total_bytes, BINARY),
        stats.entries
    );

    pipeline.shutdown().context("Failed to save cache metadata")?;
    Ok(())
}

/// One-line summary of a completed pass.
pub fn pass_summary(stats: &PassStats) -> String {
    format!(
        "Done: {} generated, {} reused, {} skipped",
        stats.generated,
        stats.reused + stats.unchanged,
        stats.skipped
    )
}
