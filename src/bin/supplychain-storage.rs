#![forbid(unsafe_code)]
//! Content-addressed storage shim for product images and metadata

use clap::{Parser, ValueEnum};
use colored::*;
use std::path::PathBuf;
use supplychain_harness::config::{load_config, StorageBackend};
use supplychain_harness::storage::{open_block_store, run_storage_server};

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Memory,
    Sqlite,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file (defaults to $HARNESS_CONFIG or ./config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,
    /// Block store backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,
    /// SQLite database file for the sqlite backend
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.storage.port = port;
    }
    if let Some(backend) = cli.backend {
        config.storage.backend = match backend {
            Backend::Memory => StorageBackend::Memory,
            Backend::Sqlite => StorageBackend::Sqlite,
        };
    }
    if let Some(db) = cli.db {
        config.storage.database_path = db;
    }

    let store = open_block_store(&config.storage)?;

    println!(
        "{} {}",
        "Storage backend is listening on PORT".bright_green(),
        config.storage.port.to_string().bright_white().bold()
    );

    run_storage_server(store, config.storage.port, config.storage.max_body_bytes).await
}
