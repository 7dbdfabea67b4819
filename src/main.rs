//! # askdocs CLI
//!
//! The `askdocs` binary runs the document question-answering service.
//!
//! ## Usage
//!
//! ```bash
//! askdocs --config ./config/askdocs.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `askdocs init` | Create the SQLite vector index and schema |
//! | `askdocs serve` | Start the HTTP server |
//!
//! The index is also created lazily on the first ingestion call, so
//! `init` is optional; it exists to verify configuration and storage
//! paths before serving traffic. Both commands are idempotent.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use askdocs::config::load_config;
use askdocs::server::run_server;
use askdocs::store::VectorStore;

/// askdocs — a retrieval-augmented document question-answering HTTP
/// service with PII-aware prompting.
#[derive(Parser)]
#[command(
    name = "askdocs",
    about = "askdocs — retrieval-augmented question answering over PDF/CSV uploads",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/askdocs.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vector index database and schema.
    Init,

    /// Start the HTTP server.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("askdocs=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = VectorStore::open(&config.storage).await?;
            store.close().await;
            println!(
                "askdocs index initialized at {}",
                config.storage.db_path.display()
            );
            Ok(())
        }
        Commands::Serve => run_server(&config).await,
    }
}
