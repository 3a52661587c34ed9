//! slidecache - CLI entry point

mod commands;

use anyhow::Result;
use clap::Parser;

use slidecache::cli::{Cli, Commands, ConfigCommands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    slidecache::logging::init(cli.verbose);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Warm {
            folder,
            recursive,
            random,
            page,
            per_page,
        } => commands::warm::handle(
            config_path,
            commands::warm::WarmOptions {
                folder,
                recursive,
                random,
                page,
                per_page,
            },
        ),
        Commands::Status => commands::status::handle(config_path),
        Commands::Evict { max_mb } => commands::evict::handle(config_path, max_mb),
        Commands::Clear { yes } => commands::clear::handle(config_path, yes),
        Commands::Show {
            image,
            width,
            height,
            out,
        } => commands::show::handle(config_path, &image, width, height, &out),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(config_path),
            ConfigCommands::Path => commands::config::handle_path(config_path),
        },
        Commands::Completions { shell } => commands::completions::handle::<Cli>(shell),
    }
}
