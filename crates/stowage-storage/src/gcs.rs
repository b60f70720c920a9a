use crate::keys;
use crate::traits::{BoxedReader, StorageError, StorageResult, Storager};
use crate::{File, ObjectAttrs, StorageBackend};
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectMeta, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stowage_core::constants::DEFAULT_UPLOAD_TIMEOUT_SECS;
use tokio::io::AsyncReadExt;

/// Google Cloud Storage implementation
#[derive(Clone, Debug)]
pub struct GoogleStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    upload_timeout: Duration,
    closed: Arc<AtomicBool>,
}

impl GoogleStorage {
    /// Create a new GoogleStorage instance
    ///
    /// # Arguments
    /// * `sa_key_json` - Service-account key, the JSON document itself (not a path)
    /// * `bucket` - Bucket every operation works against
    pub fn new(sa_key_json: &str, bucket: &str) -> StorageResult<Self> {
        let store = GoogleCloudStorageBuilder::new()
            .with_service_account_key(sa_key_json)
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        tracing::debug!(bucket = %bucket, "Google Cloud Storage client created");

        Ok(Self::with_store(Arc::new(store), bucket))
    }

    /// Wrap an already configured object store that is scoped to `bucket`.
    pub fn with_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        GoogleStorage {
            store,
            bucket: bucket.into(),
            upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.is_closed() {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    fn file_record(&self, name: &str) -> File {
        File::new(
            name,
            keys::public_url(&self.bucket, name),
            keys::storage_url(&self.bucket, name),
        )
    }

    fn object_path(name: &str) -> StorageResult<Path> {
        if name.is_empty() {
            return Err(StorageError::InvalidKey("empty object name".to_string()));
        }
        Path::parse(name).map_err(|e| StorageError::InvalidKey(e.to_string()))
    }

    fn attrs_from_meta(meta: ObjectMeta) -> ObjectAttrs {
        ObjectAttrs {
            path: meta.location.to_string(),
            size: meta.size as u64,
            last_modified: meta.last_modified,
            e_tag: meta.e_tag,
            version: meta.version,
        }
    }
}

#[async_trait]
impl Storager for GoogleStorage {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<File>> {
        self.ensure_open()?;
        let start = std::time::Instant::now();
        // Path::from would percent-encode reserved characters and miss the
        // stored names; an unparsable root lists the whole bucket instead.
        let root = keys::list_root(prefix).and_then(|dir| Path::parse(dir).ok());

        let objects: Vec<ObjectMeta> = self
            .store
            .list(root.as_ref())
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    prefix = %prefix,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "GCS list failed"
                );
                StorageError::ListFailed(e.to_string())
            })?;

        let mut files: Vec<File> = objects
            .iter()
            .filter_map(|meta| {
                let name: &str = meta.location.as_ref();
                keys::matches_prefix(name, prefix).then(|| self.file_record(name))
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!(
            bucket = %self.bucket,
            prefix = %prefix,
            count = files.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS list successful"
        );

        Ok(files)
    }

    async fn upload(
        &self,
        mut reader: BoxedReader,
        dest_filename: &str,
        content_type: &str,
    ) -> StorageResult<File> {
        self.ensure_open()?;
        let name = keys::normalize_object_name(dest_filename)?;
        let location = Self::object_path(&name)?;
        let start = std::time::Instant::now();

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await.map_err(|e| {
            StorageError::UploadFailed(format!("failed to copy to bucket: {}", e))
        })?;
        let size = buffer.len() as u64;

        let mut attributes = Attributes::new();
        if !content_type.is_empty() {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        let put = self
            .store
            .put_opts(&location, PutPayload::from(Bytes::from(buffer)), opts);

        let failure = match tokio::time::timeout(self.upload_timeout, put).await {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!(
                "deadline of {}ms exceeded",
                self.upload_timeout.as_millis()
            )),
        };

        if let Some(reason) = failure {
            tracing::error!(
                error = %reason,
                bucket = %self.bucket,
                key = %name,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "GCS upload failed"
            );
            return Err(StorageError::UploadFailed(format!(
                "failed to close: {}",
                reason
            )));
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %name,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS upload successful"
        );

        Ok(self.file_record(&name))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        self.ensure_open()?;
        let start = std::time::Instant::now();

        // The object must exist; a missing object is reported, not ignored.
        let attrs = self.metadata(path).await.map_err(|e| match e {
            StorageError::NotFound(_) | StorageError::InvalidKey(_) => e,
            other => StorageError::BackendError(format!(
                "failed to read object attributes: {}",
                other
            )),
        })?;

        let location = Self::object_path(path)?;
        let result: object_store::Result<()> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %path,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "GCS delete failed"
            );
            StorageError::DeleteFailed(format!(
                "deleting google storage object `{:?}` couldn't be done: {}",
                path, e
            ))
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %path,
            generation = attrs.version.as_deref().unwrap_or("-"),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS delete successful"
        );

        Ok(())
    }

    async fn metadata(&self, path: &str) -> StorageResult<ObjectAttrs> {
        self.ensure_open()?;
        let location = Self::object_path(path)?;

        match self.store.head(&location).await {
            Ok(meta) => Ok(Self::attrs_from_meta(meta)),
            Err(ObjectStoreError::NotFound { .. }) => Err(StorageError::NotFound(path.to_string())),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn close(&self) -> StorageResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(bucket = %self.bucket, "GCS client closed");
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Gcs
    }
}
