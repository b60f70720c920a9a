//! Storage record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote object as seen by callers: where it lives and how to address it.
///
/// Records are built fresh by every list/upload call and carry no state of
/// their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Object name inside the bucket
    pub path: String,
    /// Publicly reachable URL (only meaningful for public buckets)
    pub public_url: String,
    /// Scheme-qualified bucket path, e.g. `gs://bucket/path`
    pub storage_url: String,
}

impl File {
    pub fn new(
        path: impl Into<String>,
        public_url: impl Into<String>,
        storage_url: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            public_url: public_url.into(),
            storage_url: storage_url.into(),
        }
    }
}

/// Object metadata returned by a metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectAttrs {
    pub path: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    /// Backend object version (the generation number on GCS)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
