#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{StorageBackend, StorageError, StorageResult, Storager};
use std::sync::Arc;
use stowage_core::StorageConfig;

/// Create a storage backend based on configuration
///
/// The GCS backend goes through the process-wide client, so repeated calls
/// share one connection pool.
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storager>> {
    match config.backend {
        #[cfg(feature = "storage-gcs")]
        StorageBackend::Gcs => {
            let storage: Arc<dyn Storager> = crate::global::setup_from_config(config)?;
            Ok(storage)
        }

        #[cfg(not(feature = "storage-gcs"))]
        StorageBackend::Gcs => Err(StorageError::ConfigError(
            "GCS storage backend not available (storage-gcs feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
