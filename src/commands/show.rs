//! Show command handler

use anyhow::{bail, Context, Result};
use image::DynamicImage;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use slidecache::{imaging, Prefetcher, Size};

use super::load_config;

const DECODE_TIMEOUT: Duration = Duration::from_secs(60);

/// Decode `image` fitted inside `width` x `height` through the prefetcher
/// and write it to `out`.
#[cfg(not(tarpaulin_include))]
pub fn handle(
    config_path: Option<&Path>,
    image: &Path,
    width: u32,
    height: u32,
    out: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    if width == 0 || height == 0 {
        bail!("Target size must be non-zero, got {}x{}", width, height);
    }
    // The prefetcher drops undecodable images silently, so fail early here
    let source_size = imaging::probe_dimensions(image)
        .with_context(|| format!("Cannot read image: {}", image.display()))?;

    let (tx, rx) = mpsc::channel();
    let mut prefetcher = Prefetcher::spawn(config.prefetch.queue_capacity, tx)?;
    prefetcher.submit(image, Size::new(width, height));
    let result = rx
        .recv_timeout(DECODE_TIMEOUT)
        .with_context(|| format!("Failed to decode {}", image.display()))?;
    prefetcher.stop();

    save(&result.image, out)?;
    println!(
        "{} ({}) -> {} ({}x{})",
        image.display(),
        source_size,
        out.display(),
        result.image.width(),
        result.image.height()
    );
    Ok(())
}

/// Save in the format implied by the extension. JPEG has no alpha channel.
fn save(img: &DynamicImage, out: &Path) -> Result<()> {
    let is_jpeg = out
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));

    let saved = if is_jpeg {
        DynamicImage::ImageRgb8(img.to_rgb8()).save(out)
    } else {
        img.save(out)
    };
    saved.with_context(|| format!("Failed to write {}", out.display()))
}
