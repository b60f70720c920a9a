//! List the objects under a remote path.
//!
//! Usage: `./list /env/file/.env remote/path`. The env file must provide
//! GCS_SA_KEY_JSON and GCS_BUCKET.

use anyhow::Context;
use clap::Parser;
use stowage_cli::init_tracing;
use stowage_core::constants::{ENV_GCS_BUCKET, ENV_GCS_SA_KEY_JSON};
use stowage_core::load_env_file;
use stowage_storage::{global, Storager};

#[derive(Parser, Debug)]
#[command(name = "list")]
#[command(about = "List files stored under a remote path")]
#[command(after_help = "Example:\n\n\t./list /env/file/.env remote/path")]
struct Args {
    /// Dotenv file providing GCS_SA_KEY_JSON and GCS_BUCKET
    env: std::path::PathBuf,

    /// Remote prefix to list
    remote_path: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    load_env_file(&args.env)?;

    let sa_key_json = std::env::var(ENV_GCS_SA_KEY_JSON).unwrap_or_default();
    let bucket = std::env::var(ENV_GCS_BUCKET).unwrap_or_default();

    let storage = global::setup(&sa_key_json, &bucket)
        .with_context(|| format!("{} and {} are required", ENV_GCS_SA_KEY_JSON, ENV_GCS_BUCKET))?;

    let mut stdout = std::io::stdout().lock();
    let result = stowage_cli::list(storage.as_ref(), &args.remote_path, false, &mut stdout).await;

    storage.close().await.context("Failed to close storage")?;
    result.map(|_| ())
}
