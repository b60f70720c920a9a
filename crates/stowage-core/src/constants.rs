//! Shared constants

/// Host used to build public URLs for Google Cloud Storage objects.
pub const GCS_PUBLIC_HOST: &str = "https://gs.googleapis.com";

/// Scheme of storage URLs (`gs://bucket/path`).
pub const GCS_URL_SCHEME: &str = "gs";

/// Default deadline for a single upload.
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Content type used when none can be inferred.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub const ENV_STORAGE_BACKEND: &str = "STORAGE_BACKEND";
pub const ENV_GCS_SA_KEY_JSON: &str = "GCS_SA_KEY_JSON";
pub const ENV_GCS_BUCKET: &str = "GCS_BUCKET";
pub const ENV_GCS_UPLOAD_TIMEOUT_SECS: &str = "GCS_UPLOAD_TIMEOUT_SECS";
pub const ENV_LOCAL_STORAGE_PATH: &str = "LOCAL_STORAGE_PATH";
pub const ENV_LOCAL_STORAGE_BASE_URL: &str = "LOCAL_STORAGE_BASE_URL";
