//! Command implementations shared by the `stowage` and `list` binaries.
//!
//! Commands take any [`Storager`] and a writer so they can run against the
//! in-memory backend in tests.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use stowage_core::constants::DEFAULT_CONTENT_TYPE;
use stowage_core::File;
use stowage_storage::{BoxedReader, Storager};

/// Initialize tracing for CLI binaries. Logs go to stderr so stdout stays parseable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_json(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Serialize response")?;
    writeln!(out, "{}", rendered)?;
    Ok(())
}

/// Print one `> path` line per file followed by the total.
pub fn write_listing(out: &mut impl Write, files: &[File]) -> anyhow::Result<()> {
    for file in files {
        writeln!(out, "> {}", file.path)?;
    }
    writeln!(out, "> all files: {}", files.len())?;
    Ok(())
}

/// List `remote_path` and print it, as lines or as a JSON array.
pub async fn list(
    storage: &dyn Storager,
    remote_path: &str,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let files = storage
        .list(remote_path)
        .await
        .with_context(|| format!("Failed to list '{}'", remote_path))?;

    if json {
        print_json(out, &files)?;
    } else {
        write_listing(out, &files)?;
    }

    Ok(files.len())
}

/// Upload a local file and print the resulting record as JSON.
pub async fn upload(
    storage: &dyn Storager,
    local_file: &Path,
    dest: &str,
    content_type: Option<&str>,
    out: &mut impl Write,
) -> anyhow::Result<File> {
    let source = tokio::fs::File::open(local_file)
        .await
        .with_context(|| format!("Failed to open {}", local_file.display()))?;
    let reader: BoxedReader = Box::pin(source);

    let content_type = content_type
        .map(str::to_string)
        .unwrap_or_else(|| content_type_for_path(local_file).to_string());

    let file = storage
        .upload(reader, dest, &content_type)
        .await
        .with_context(|| format!("Failed to upload {} to '{}'", local_file.display(), dest))?;

    print_json(out, &file)?;
    Ok(file)
}

pub async fn delete(
    storage: &dyn Storager,
    remote_path: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    storage
        .delete(remote_path)
        .await
        .with_context(|| format!("Failed to delete '{}'", remote_path))?;
    writeln!(out, "> deleted: {}", remote_path)?;
    Ok(())
}

pub async fn stat(
    storage: &dyn Storager,
    remote_path: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let attrs = storage
        .metadata(remote_path)
        .await
        .with_context(|| format!("Failed to read metadata of '{}'", remote_path))?;
    print_json(out, &attrs)
}

/// Guess a content type from the file extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        // Video / audio
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        // Documents
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use stowage_storage::{MemoryStorage, NoopStorage};

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn listing_format() {
        let files = vec![
            File::new("a/1.txt", "", ""),
            File::new("a/2.txt", "", ""),
        ];
        let mut out = Vec::new();
        write_listing(&mut out, &files).unwrap();
        assert_eq!(output(out), "> a/1.txt\n> a/2.txt\n> all files: 2\n");
    }

    #[tokio::test]
    async fn list_prints_matching_objects() {
        let storage = MemoryStorage::new("bucket");
        storage.set_file("reports/jan.csv", b"1".to_vec());
        storage.set_file("reports/feb.csv", b"2".to_vec());
        storage.set_file("other.txt", b"3".to_vec());

        let mut out = Vec::new();
        let count = list(&storage, "reports/", false, &mut out).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            output(out),
            "> reports/feb.csv\n> reports/jan.csv\n> all files: 2\n"
        );
    }

    #[tokio::test]
    async fn list_json_uses_record_keys() {
        let storage = MemoryStorage::new("bucket");
        storage.set_file("x.txt", b"1".to_vec());

        let mut out = Vec::new();
        list(&storage, "", true, &mut out).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
        assert_eq!(value[0]["path"], "x.txt");
        assert_eq!(value[0]["storage_url"], "gs://bucket/x.txt");
        assert_eq!(value[0]["public_url"], "https://gs.googleapis.com/bucket/x.txt");
    }

    #[tokio::test]
    async fn list_against_noop_storage_reports_zero() {
        let mut out = Vec::new();
        let count = list(&NoopStorage, "anything", false, &mut out).await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(output(out), "> all files: 0\n");
    }

    #[tokio::test]
    async fn upload_guesses_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("photo.PNG");
        std::fs::write(&local, b"not really a png").unwrap();

        let storage = MemoryStorage::new("bucket");
        let mut out = Vec::new();
        let file = upload(&storage, &local, "/images/photo.png", None, &mut out)
            .await
            .unwrap();

        assert_eq!(file.path, "images/photo.png");
        assert_eq!(
            storage.content_type("images/photo.png").as_deref(),
            Some("image/png")
        );
        assert!(output(out).contains("\"storage_url\": \"gs://bucket/images/photo.png\""));
    }

    #[tokio::test]
    async fn upload_missing_local_file_fails() {
        let storage = MemoryStorage::new("bucket");
        let mut out = Vec::new();
        let err = upload(
            &storage,
            &PathBuf::from("/no/such/file.bin"),
            "file.bin",
            Some("application/octet-stream"),
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }

    #[tokio::test]
    async fn delete_and_stat() {
        let storage = MemoryStorage::new("bucket");
        storage.set_file("old.log", b"12345".to_vec());

        let mut out = Vec::new();
        stat(&storage, "old.log", &mut out).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
        assert_eq!(value["size"], 5);

        let mut out = Vec::new();
        delete(&storage, "old.log", &mut out).await.unwrap();
        assert_eq!(output(out), "> deleted: old.log\n");

        let mut out = Vec::new();
        assert!(delete(&storage, "old.log", &mut out).await.is_err());
    }

    #[test]
    fn content_type_fallback() {
        assert_eq!(content_type_for_path(Path::new("a.csv")), "text/csv");
        assert_eq!(content_type_for_path(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(
            content_type_for_path(Path::new("no_extension")),
            "application/octet-stream"
        );
    }
}
