//! Stowage CLI — list, upload, delete and inspect objects in the configured bucket.
//!
//! Settings come from the environment (optionally a dotenv file passed with
//! `--env`): STORAGE_BACKEND, GCS_SA_KEY_JSON, GCS_BUCKET, or LOCAL_STORAGE_PATH
//! and LOCAL_STORAGE_BASE_URL for the local backend.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use stowage_cli::init_tracing;
use stowage_core::{load_env_file, StorageConfig};
use stowage_storage::create_storage;

#[derive(Parser)]
#[command(name = "stowage", about = "Object storage CLI")]
struct Cli {
    /// Dotenv file to load before reading the environment
    #[arg(long, global = true, value_name = "FILE")]
    env: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List objects whose name starts with the given prefix
    List {
        /// Remote prefix (empty lists the whole bucket)
        #[arg(default_value = "")]
        remote_path: String,
        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload a local file
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Destination object name
        dest: String,
        /// Content type (guessed from the extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Delete an object
    Delete {
        /// Object name
        remote_path: String,
    },
    /// Show object metadata
    Stat {
        /// Object name
        remote_path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match &cli.env {
        Some(path) => load_env_file(path)?,
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let config = StorageConfig::from_env().context("Failed to read storage configuration")?;
    config.validate()?;

    let storage = create_storage(&config)
        .await
        .context("Failed to create storage backend")?;
    tracing::debug!(backend = %storage.backend_type(), "Storage backend ready");

    let mut stdout = std::io::stdout().lock();
    let result = match cli.command {
        Commands::List { remote_path, json } => {
            stowage_cli::list(storage.as_ref(), &remote_path, json, &mut stdout)
                .await
                .map(|_| ())
        }
        Commands::Upload {
            file,
            dest,
            content_type,
        } => stowage_cli::upload(
            storage.as_ref(),
            &file,
            &dest,
            content_type.as_deref(),
            &mut stdout,
        )
        .await
        .map(|_| ()),
        Commands::Delete { remote_path } => {
            stowage_cli::delete(storage.as_ref(), &remote_path, &mut stdout).await
        }
        Commands::Stat { remote_path } => {
            stowage_cli::stat(storage.as_ref(), &remote_path, &mut stdout).await
        }
    };

    storage.close().await.context("Failed to close storage")?;
    result
}
