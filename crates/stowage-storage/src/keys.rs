//! Object name normalization and URL formatting shared by the backends.

use crate::traits::{StorageError, StorageResult};
use stowage_core::constants::{GCS_PUBLIC_HOST, GCS_URL_SCHEME};

/// Clean a slash-separated path lexically.
///
/// Repeated separators collapse, `.` segments are dropped and `..` removes the
/// preceding segment. A `..` directly under a rooted path is discarded; in a
/// relative path with nothing left to remove it is kept. An empty result is `.`
/// (or `/` when rooted).
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Turn a caller-supplied destination into an object name.
///
/// The path is cleaned and leading `/` characters are stripped. Names that end
/// up empty, `.` or escaping the bucket root are rejected.
pub fn normalize_object_name(name: &str) -> StorageResult<String> {
    let cleaned = clean_path(name);
    let normalized = cleaned.trim_start_matches('/');

    if normalized.is_empty() || normalized == "." {
        return Err(StorageError::InvalidKey(format!(
            "'{}' does not name an object",
            name
        )));
    }

    if normalized == ".." || normalized.starts_with("../") {
        return Err(StorageError::InvalidKey(format!(
            "'{}' resolves outside the bucket root",
            name
        )));
    }

    Ok(normalized.to_string())
}

/// Public URL of an object: `https://gs.googleapis.com/{bucket}/{path}`
pub fn public_url(bucket: &str, path: &str) -> String {
    format!("{}/{}/{}", GCS_PUBLIC_HOST, bucket, path)
}

/// Storage URL of an object: `gs://{bucket}/{path}`
pub fn storage_url(bucket: &str, path: &str) -> String {
    format!("{}://{}/{}", GCS_URL_SCHEME, bucket, path)
}

/// Directory part of a listing prefix, used to scope a segment-based listing.
///
/// `a/b/c` gives `Some("a/b")`, `a/b/` gives `Some("a/b")`, `abc` gives `None`.
/// The caller still has to filter results with [`matches_prefix`].
pub fn list_root(prefix: &str) -> Option<&str> {
    let dir = match prefix.rfind('/') {
        Some(idx) => &prefix[..idx],
        None => return None,
    };
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        None
    } else {
        Some(dir)
    }
}

/// Raw string prefix match, as the GCS `prefix` query performs it.
pub fn matches_prefix(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix)
}
