mod app;

use std::{
    fs::{self, OpenOptions},
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shelf_core::{
    config::{self, AppConfig},
    BggClient, FileStorage, SortOrder,
};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

use crate::app::ShelfApp;

/// Search BoardGameGeek and keep a local board game collection.
#[derive(Debug, Parser)]
#[command(name = "shelf", version)]
struct Cli {
    /// Fall back to the built-in games when the catalog is unreachable.
    #[arg(long, global = true, env = "SHELF_OFFLINE_FALLBACK")]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search the catalog by name.
    Search {
        /// Game name (words are joined with spaces).
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Add a game to the collection by catalog id.
    Add { id: String },
    /// Remove a game from the collection.
    Remove { id: String },
    /// Show whether a game is in the collection.
    Owned { id: String },
    /// List the collection sorted by name.
    List {
        /// Sort Z to A.
        #[arg(long)]
        desc: bool,
    },
    /// Replace the collection with a JSON export.
    Import { file: PathBuf },
    /// Write the collection to board-game-collection-<date>.json.
    Export {
        /// Target directory (defaults to the current directory).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    config::ensure_default_config()?;
    let mut config = AppConfig::load()?;
    if cli.offline {
        config.offline_fallback = true;
    }
    init_logging(&config)?;

    let storage = Arc::new(FileStorage::new(config.data_dir.clone()));
    let app = ShelfApp::new(&config, BggClient::new(&config), storage);
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Search { query } => app.search(&query.join(" "), &mut out).await,
        Command::Add { id } => app.add(&id, &mut out).await,
        Command::Remove { id } => app.remove(&id, &mut out),
        Command::Owned { id } => app.owned(&id, &mut out),
        Command::List { desc } => {
            let order = if desc {
                SortOrder::NameDesc
            } else {
                SortOrder::NameAsc
            };
            app.list(order, &mut out)
        }
        Command::Import { file } => app.import(&file, &mut out),
        Command::Export { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir().context("failed to resolve current directory")?,
            };
            app.export(&dir, &mut out).map(|_| ())
        }
    }
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join("shelf.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .with_filter(LevelFilter::WARN);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file))
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
