//! Test doubles for code written against [`Storager`].

use crate::keys;
use crate::traits::{BoxedReader, StorageError, StorageResult, Storager};
use crate::{File, ObjectAttrs, StorageBackend};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::io::AsyncReadExt;

/// Storager that accepts every call and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorage;

#[async_trait]
impl Storager for NoopStorage {
    async fn list(&self, _prefix: &str) -> StorageResult<Vec<File>> {
        Ok(Vec::new())
    }

    async fn upload(
        &self,
        _reader: BoxedReader,
        _dest_filename: &str,
        _content_type: &str,
    ) -> StorageResult<File> {
        Ok(File::default())
    }

    async fn delete(&self, _path: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn metadata(&self, path: &str) -> StorageResult<ObjectAttrs> {
        Ok(ObjectAttrs {
            path: path.to_string(),
            size: 0,
            last_modified: DateTime::<Utc>::UNIX_EPOCH,
            e_tag: None,
            version: None,
        })
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Gcs
    }
}

struct StoredObject {
    data: Vec<u8>,
    content_type: String,
    last_modified: DateTime<Utc>,
}

/// In-memory storager producing the same records as the GCS backend.
pub struct MemoryStorage {
    bucket: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    closed: AtomicBool,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Store an object directly, bypassing name normalization
    pub fn set_file(&self, name: &str, data: Vec<u8>) {
        self.objects.lock().unwrap().insert(
            name.to_string(),
            StoredObject {
                data,
                content_type: String::new(),
                last_modified: Utc::now(),
            },
        );
    }

    /// Get file data (for test assertions)
    pub fn get_file(&self, name: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(name).map(|o| o.data.clone())
    }

    /// Content type recorded at upload (for test assertions)
    pub fn content_type(&self, name: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(name)
            .map(|o| o.content_type.clone())
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
}

#[async_trait]
impl Storager for MemoryStorage {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<File>> {
        self.ensure_open()?;
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .keys()
            .filter(|name| keys::matches_prefix(name, prefix))
            .map(|name| self.file_record(name))
            .collect())
    }

    async fn upload(
        &self,
        mut reader: BoxedReader,
        dest_filename: &str,
        content_type: &str,
    ) -> StorageResult<File> {
        self.ensure_open()?;
        let name = keys::normalize_object_name(dest_filename)?;

        let mut data = Vec::new();
        reader.read_to_end(&mut data).await.map_err(|e| {
            StorageError::UploadFailed(format!("failed to copy to bucket: {}", e))
        })?;

        self.objects.lock().unwrap().insert(
            name.clone(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );

        Ok(self.file_record(&name))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        self.ensure_open()?;
        match self.objects.lock().unwrap().remove(path) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(path.to_string())),
        }
    }

    async fn metadata(&self, path: &str) -> StorageResult<ObjectAttrs> {
        self.ensure_open()?;
        let objects = self.objects.lock().unwrap();
        let object = objects
            .get(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;

        Ok(ObjectAttrs {
            path: path.to_string(),
            size: object.data.len() as u64,
            last_modified: object.last_modified,
            e_tag: None,
            version: None,
        })
    }

    async fn close(&self) -> StorageResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Gcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &'static [u8]) -> BoxedReader {
        Box::pin(std::io::Cursor::new(data))
    }

    #[tokio::test]
    async fn noop_storage_does_nothing() {
        let storage = NoopStorage;

        assert!(storage.list("anything").await.unwrap().is_empty());
        assert_eq!(
            storage.upload(reader(b"x"), "a.txt", "text/plain").await.unwrap(),
            File::default()
        );
        storage.delete("a.txt").await.unwrap();
        storage.close().await.unwrap();
        // still usable after close
        assert!(storage.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_storage_round_trip() {
        let storage = MemoryStorage::new("mem");

        let file = storage
            .upload(reader(b"abc"), "/x/../y.txt", "text/plain")
            .await
            .unwrap();
        assert_eq!(file.path, "y.txt");
        assert_eq!(file.storage_url, "gs://mem/y.txt");
        assert_eq!(storage.get_file("y.txt").unwrap(), b"abc");
        assert_eq!(storage.content_type("y.txt").as_deref(), Some("text/plain"));

        assert_eq!(storage.metadata("y.txt").await.unwrap().size, 3);
        storage.delete("y.txt").await.unwrap();
        assert!(matches!(
            storage.delete("y.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn memory_storage_close() {
        let storage = MemoryStorage::new("mem");
        storage.close().await.unwrap();
        assert!(storage.is_closed());
        assert!(matches!(storage.list("").await, Err(StorageError::Closed)));
    }
}
