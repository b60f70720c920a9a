//! Process-wide Google Cloud Storage client.
//!
//! Binaries call [`setup`] once at start-up; everything else fetches the shared
//! instance with [`get`]. The first successful setup wins: later calls return
//! the installed instance whatever arguments they carry.

use crate::gcs::GoogleStorage;
use crate::traits::{StorageError, StorageResult};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use stowage_core::constants::DEFAULT_UPLOAD_TIMEOUT_SECS;
use stowage_core::StorageConfig;

static GOOGLE_STORAGE: OnceLock<Arc<GoogleStorage>> = OnceLock::new();

/// Build and install the shared client, or return the one already installed.
pub fn setup(sa_key_json: &str, bucket: &str) -> StorageResult<Arc<GoogleStorage>> {
    setup_with_timeout(
        sa_key_json,
        bucket,
        Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
    )
}

/// Same as [`setup`], taking the key, bucket and upload timeout from configuration.
pub fn setup_from_config(config: &StorageConfig) -> StorageResult<Arc<GoogleStorage>> {
    setup_with_timeout(
        config.gcs_sa_key_json().unwrap_or_default(),
        config.gcs_bucket().unwrap_or_default(),
        config.upload_timeout,
    )
}

fn setup_with_timeout(
    sa_key_json: &str,
    bucket: &str,
    upload_timeout: Duration,
) -> StorageResult<Arc<GoogleStorage>> {
    if sa_key_json.is_empty() || bucket.is_empty() {
        return Err(StorageError::ConfigError(
            "service-account key and bucket name are required".to_string(),
        ));
    }

    if let Some(existing) = GOOGLE_STORAGE.get() {
        return Ok(existing.clone());
    }

    let storage = GoogleStorage::new(sa_key_json, bucket)?.with_upload_timeout(upload_timeout);
    Ok(install(storage))
}

/// Install a prebuilt client. If one is already installed it is kept and returned.
pub fn install(storage: GoogleStorage) -> Arc<GoogleStorage> {
    let installed = GOOGLE_STORAGE.get_or_init(|| Arc::new(storage));
    tracing::debug!(bucket = %installed.bucket(), "Shared GCS client ready");
    installed.clone()
}

/// The shared client, once [`setup`] (or [`install`]) has run.
pub fn get() -> StorageResult<Arc<GoogleStorage>> {
    GOOGLE_STORAGE.get().cloned().ok_or(StorageError::NotInitialized)
}
