//! tilecache command-line entry point.
//!
//! Resolves map resources through the offline-first cascade and reports the
//! outcome as JSON on stdout. Logging goes to stderr so output can be piped.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tilecache_core::config::AppConfig;
use tilecache_core::{Resource, ResourceKind, Scheme};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "tilecache", version, about = "Offline-first map resource cache")]
struct Cli {
    /// Offline MBTiles package (overrides TILECACHE_PACKAGE_PATH)
    #[arg(long, global = true)]
    package: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a non-tile resource by URL
    Get {
        url: String,

        #[arg(long, value_enum, default_value_t = KindArg::Generic)]
        kind: KindArg,

        /// Write the payload to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a tile by XYZ coordinates
    Tile {
        z: u32,
        x: u32,
        y: u32,

        /// Tile URL template (defaults to the configured template)
        #[arg(long)]
        template: Option<String>,

        /// Write the payload to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List tiles stored in the package
    Scan {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Generic,
    Style,
    Source,
    Glyphs,
    SpriteImage,
    SpriteJson,
    Image,
}

impl From<KindArg> for ResourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Generic => ResourceKind::Generic,
            KindArg::Style => ResourceKind::Style,
            KindArg::Source => ResourceKind::Source,
            KindArg::Glyphs => ResourceKind::Glyphs,
            KindArg::SpriteImage => ResourceKind::SpriteImage,
            KindArg::SpriteJson => ResourceKind::SpriteJson,
            KindArg::Image => ResourceKind::Image,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(package) = cli.package {
        config.package_path = Some(package);
    }

    match cli.command {
        Command::Get { url, kind, output } => {
            let resource = Resource::new(kind.into(), url);
            let response = commands::resolve(&config, resource.clone()).await?;
            commands::report(&resource, &response, output.as_deref())?;
        }
        Command::Tile { z, x, y, template, output } => {
            let template = template.unwrap_or_else(|| config.tile_url_template.clone());
            let url = tilecache_core::resource::tile_url(&template, z, x, y);
            let resource = Resource::tile(url, x, y, z, Scheme::Xyz);
            let response = commands::resolve(&config, resource.clone()).await?;
            commands::report(&resource, &response, output.as_deref())?;
        }
        Command::Scan { limit } => {
            let package = config.require_package_path()?;
            commands::scan(package, &config.tile_url_template, limit).await?;
        }
    }

    Ok(())
}
