use crate::keys;
use crate::traits::{BoxedReader, StorageError, StorageResult, Storager};
use crate::{File, ObjectAttrs, StorageBackend};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory acting as the bucket (e.g., "/var/lib/stowage")
    /// * `base_url` - Base URL the directory is served from (e.g., "http://localhost:8080/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert an object name to a filesystem path inside the base directory
    fn key_to_path(&self, name: &str) -> StorageResult<PathBuf> {
        if name.is_empty() {
            return Err(StorageError::InvalidKey("empty object name".to_string()));
        }
        if name.split('/').any(|segment| segment == "..") || name.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Object name contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(name))
    }

    fn file_record(&self, name: &str) -> File {
        File::new(
            name,
            format!("{}/{}", self.base_url.trim_end_matches('/'), name),
            format!("file://{}/{}", self.base_path.display(), name),
        )
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Every regular file below the base directory, as slash-separated names
    async fn walk(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        let mut pending = vec![self.base_path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    let relative = path.strip_prefix(&self.base_path).map_err(|e| {
                        StorageError::BackendError(format!(
                            "{} is outside {}: {}",
                            path.display(),
                            self.base_path.display(),
                            e
                        ))
                    })?;
                    let name = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    names.push(name);
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl Storager for LocalStorage {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<File>> {
        let start = std::time::Instant::now();

        let files: Vec<File> = self
            .walk()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?
            .iter()
            .filter(|name| keys::matches_prefix(name, prefix))
            .map(|name| self.file_record(name))
            .collect();

        tracing::info!(
            path = %self.base_path.display(),
            prefix = %prefix,
            count = files.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage list successful"
        );

        Ok(files)
    }

    async fn upload(
        &self,
        mut reader: BoxedReader,
        dest_filename: &str,
        _content_type: &str,
    ) -> StorageResult<File> {
        let name = keys::normalize_object_name(dest_filename)?;
        let path = self.key_to_path(&name)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let bytes_copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %name,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(self.file_record(&name))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let file_path = self.key_to_path(path)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&file_path).await? {
            return Err(StorageError::NotFound(path.to_string()));
        }

        fs::remove_file(&file_path).await.map_err(|e| {
            StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %file_path.display(),
            key = %path,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn metadata(&self, path: &str) -> StorageResult<ObjectAttrs> {
        let file_path = self.key_to_path(path)?;

        let meta = match fs::metadata(&file_path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(StorageError::NotFound(path.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => return Err(StorageError::BackendError(e.to_string())),
        };

        let last_modified: DateTime<Utc> = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        Ok(ObjectAttrs {
            path: path.to_string(),
            size: meta.len(),
            last_modified,
            e_tag: None,
            version: None,
        })
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const BASE_URL: &str = "http://localhost:8080/files";

    fn reader(data: &'static [u8]) -> BoxedReader {
        Box::pin(std::io::Cursor::new(data))
    }

    #[tokio::test]
    async fn test_local_storage_upload_and_list() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        let file = storage
            .upload(reader(b"test data"), "/docs//a.txt", "text/plain")
            .await
            .unwrap();

        assert_eq!(file.path, "docs/a.txt");
        assert_eq!(file.public_url, "http://localhost:8080/files/docs/a.txt");
        assert!(file.storage_url.starts_with("file://"));
        assert!(file.storage_url.ends_with("/docs/a.txt"));

        let on_disk = tokio::fs::read(dir.path().join("docs/a.txt")).await.unwrap();
        assert_eq!(on_disk, b"test data");

        let listed = storage.list("docs").await.unwrap();
        assert_eq!(listed, vec![file]);
    }

    #[tokio::test]
    async fn test_list_filters_by_raw_prefix() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        for name in ["img/a.png", "imgs.txt", "other/b.png"] {
            storage.upload(reader(b"x"), name, "").await.unwrap();
        }

        let names: Vec<String> = storage
            .list("img")
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.path)
            .collect();
        assert_eq!(names, vec!["img/a.png", "imgs.txt"]);
        assert_eq!(storage.list("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        let result = storage.metadata("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        storage.upload(reader(b"x"), "gone.txt", "").await.unwrap();
        storage.delete("gone.txt").await.unwrap();

        assert!(storage.list("").await.unwrap().is_empty());
        assert!(matches!(
            storage.delete("gone.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_surfaces_io_errors() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        storage.upload(reader(b"x"), "plain.txt", "").await.unwrap();

        // A regular file used as a directory is an IO failure, not a missing object.
        let result = storage.delete("plain.txt/child").await;
        assert!(matches!(result, Err(StorageError::IoError(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_local_storage_metadata() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        storage.upload(reader(b"1234"), "m.bin", "").await.unwrap();

        let attrs = storage.metadata("m.bin").await.unwrap();
        assert_eq!(attrs.size, 4);
        assert!(matches!(
            storage.metadata("missing.bin").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
