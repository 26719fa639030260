//! `thumbs`: resolve thumbnail requests from the command line.

mod error;

use clap::{Parser, Subcommand};
use exn::ResultExt;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thumbs_config::Config;
use thumbs_index::{Database, Repository};
use thumbs_render::ImageRenderer;
use thumbs_resolve::{CropRequest, Policy, RequestCache, Resolution, Resolver, SizeRegistry, ThumbRequest};
use thumbs_storage::backend::LocalBackend;
use thumbs_storage::{BackendHandle, Roots};
use tracing_subscriber::EnvFilter;

use crate::error::{ErrorKind, Result};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (defaults to `config.toml` in the platform config
    /// directory, if present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a thumbnail request and print where it was served from.
    Resolve {
        hash: String,
        size: String,
        /// Crop area (`xxxyyywwwhhh`); requires a crop size class.
        #[arg(long)]
        crop: Option<String>,
        /// Resolve as a download request.
        #[arg(long)]
        download: bool,
        /// Write the resolved bytes (or placeholder image) to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the registered size classes.
    Sizes,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Sizes => sizes(&config),
        Command::Resolve { hash, size, crop, download, output } => {
            let (db, resolver) = open(&config).await?;
            let resolution = match crop {
                Some(area) => {
                    let mut request = CropRequest::new(hash, size, area);
                    request.download = download;
                    resolver.resolve_crop(&request).await
                },
                None => {
                    let mut request = ThumbRequest::new(hash, size);
                    request.download = download;
                    resolver.resolve(&request).await
                },
            };
            let printed = report(&resolution, output.as_deref()).await;
            resolver.drain().await;
            db.close().await;
            printed
        },
    }
}

fn sizes(config: &Config) -> Result<()> {
    let registry = SizeRegistry::new(config.thumbs.precached, config.thumbs.max);
    let mut out = std::io::stdout().lock();
    for size in registry.iter() {
        let mut flags = Vec::new();
        if size.uncached {
            flags.push("uncached");
        }
        if size.exceeds_limit {
            flags.push("exceeds-limit");
        }
        if size.is_crop() {
            flags.push("crop");
        }
        writeln!(out, "{:<10} {:>4}x{:<4} {}", size.name, size.width, size.height, flags.join(","))
            .or_raise(|| ErrorKind::Output)?;
    }
    Ok(())
}

/// Wire the configured stores, index, and renderer into a resolver.
async fn open(config: &Config) -> Result<(Database, Resolver)> {
    let thumbs: BackendHandle = Arc::new(
        LocalBackend::new("thumbs", &config.storage.thumbs).or_raise(|| ErrorKind::Storage("thumbs".to_string()))?,
    );
    let mut roots = Roots::new();
    for (name, path) in &config.storage.originals {
        let backend = LocalBackend::new(name.clone(), path).or_raise(|| ErrorKind::Storage(name.clone()))?;
        roots.insert(name.clone(), Arc::new(backend));
    }

    if let Some(parent) = config.index.database.parent() {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Index)?;
    }
    let db = Database::connect(&config.index.database).await.or_raise(|| ErrorKind::Index)?;
    let repo = Repository::new(db.pool().clone(), config.index.read_only);

    let renderer = ImageRenderer::new(thumbs.clone(), config.thumbs.render_settings());
    let resolver = Resolver::new(
        SizeRegistry::new(config.thumbs.precached, config.thumbs.max),
        RequestCache::new(config.cache.ttl(), config.cache.capacity),
        Arc::new(repo),
        thumbs,
        roots,
        Arc::new(renderer),
        Policy { render_uncached: config.thumbs.render_uncached, download_name: config.download.name },
    );
    Ok((db, resolver))
}

async fn report(resolution: &Resolution, output: Option<&std::path::Path>) -> Result<()> {
    {
        let mut out = std::io::stdout().lock();
        writeln!(out, "outcome:      {:?}", resolution.outcome).or_raise(|| ErrorKind::Output)?;
        if let Some(path) = resolution.path() {
            writeln!(out, "path:         {}", path.display()).or_raise(|| ErrorKind::Output)?;
        }
        writeln!(out, "content-type: {}", resolution.content_type()).or_raise(|| ErrorKind::Output)?;
        if let Some(name) = resolution.download_name() {
            writeln!(out, "download:     {name}").or_raise(|| ErrorKind::Output)?;
        }
    }
    let Some(output) = output else {
        return Ok(());
    };
    let bytes = match (resolution.path(), resolution.as_placeholder()) {
        (Some(path), _) => tokio::fs::read(path).await.or_raise(|| ErrorKind::Output)?,
        (None, Some(placeholder)) => placeholder.svg().or_raise(|| ErrorKind::Output)?.into_owned(),
        (None, None) => return Ok(()),
    };
    tokio::fs::write(output, bytes).await.or_raise(|| ErrorKind::Output)
}
