//! CLI definitions for slidecache
//!
//! Kept out of main.rs so the command tree is reachable from the library,
//! e.g. for completion generation.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

/// Build clap styles for help output.
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "slidecache")]
#[command(about = "Thumbnail cache and image prefetcher for slideshow viewers")]
#[command(
    long_about = "slidecache - Persistent thumbnail cache for image folders.

slidecache generates downscaled thumbnails for every image in a folder,
serving the visible page first, and keeps them on disk under a size budget
with least-recently-used eviction. Cache metadata survives restarts.

QUICK START:
    slidecache warm ~/Pictures       Build thumbnails for a folder
    slidecache status                Check cache usage
    slidecache evict --max-mb 50     Shrink the cache to a budget
    slidecache clear --yes           Delete every cached thumbnail

Configuration lives in ~/.config/slidecache/config.toml"
)]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Use this config file instead of ~/.config/slidecache/config.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate thumbnails for a folder
    #[command(long_about = "Scan a folder and generate any missing thumbnails.

Runs one full pass of the thumbnail worker. Images on the selected page are
processed first, then the rest of the folder in order. Existing thumbnails
whose source has not changed are reused. Press Ctrl-C to stop early; work
done so far is kept.

EXAMPLES:
    slidecache warm ~/Pictures
    slidecache warm ~/Pictures --recursive
    slidecache warm ~/Pictures --page 3 --per-page 20")]
    Warm {
        /// Folder to scan (defaults to library.folder from config)
        #[arg(help = "Folder to scan (defaults to library.folder)")]
        folder: Option<PathBuf>,
        /// Descend into subdirectories
        #[arg(long, short)]
        recursive: bool,
        /// Shuffle the image order
        #[arg(long)]
        random: bool,
        /// Page to prioritize (0-based)
        #[arg(long, default_value_t = 0)]
        page: usize,
        /// Thumbnails per page; without it no page is prioritized
        #[arg(long, value_name = "N")]
        per_page: Option<usize>,
    },

    /// Show thumbnail cache usage
    Status,

    /// Run one eviction pass
    #[command(long_about = "Delete least recently used thumbnails until the cache fits.

Eviction shrinks the cache to 90% of the budget once it is exceeded.

EXAMPLES:
    slidecache evict               Use cache.max_size_mb from config
    slidecache evict --max-mb 20   Use a one-off budget")]
    Evict {
        /// Budget in megabytes (minimum 1)
        #[arg(long, value_name = "MB")]
        max_mb: Option<f64>,
    },

    /// Delete every cached thumbnail
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Decode an image fitted to a size and save it
    #[command(long_about = "Decode an image scaled to fit inside WIDTH x HEIGHT.

The aspect ratio is kept. The output format follows the extension of --out.

EXAMPLE:
    slidecache show photo.jpg --width 1920 --height 1080 --out preview.png")]
    Show {
        /// Source image
        image: PathBuf,
        /// Target width in pixels
        #[arg(long)]
        width: u32,
        /// Target height in pixels
        #[arg(long)]
        height: u32,
        /// Output file
        #[arg(long, short)]
        out: PathBuf,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration as TOML
    Show,
    /// Print the config file location
    Path,
}
