//! Configuration module
//!
//! Storage settings are read from environment variables. Binaries usually load
//! a dotenv file first with [`load_env_file`].

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use crate::constants::{
    DEFAULT_UPLOAD_TIMEOUT_SECS, ENV_GCS_BUCKET, ENV_GCS_SA_KEY_JSON,
    ENV_GCS_UPLOAD_TIMEOUT_SECS, ENV_LOCAL_STORAGE_BASE_URL, ENV_LOCAL_STORAGE_PATH,
    ENV_STORAGE_BACKEND,
};
use crate::storage_types::StorageBackend;

/// Load variables from a dotenv file into the process environment.
///
/// Variables already present in the environment are not overridden.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<(), anyhow::Error> {
    let path = path.as_ref();
    dotenvy::from_path(path)
        .map_err(|_| anyhow::anyhow!("file '{}' cannot be found", path.display()))
}

/// Storage configuration
#[derive(Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Service-account key, as the JSON document itself
    pub gcs_sa_key_json: Option<String>,
    pub gcs_bucket: Option<String>,
    pub upload_timeout: Duration,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

// The service-account key is a credential; keep it out of logs.
impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field(
                "gcs_sa_key_json",
                &self.gcs_sa_key_json.as_ref().map(|_| "<redacted>"),
            )
            .field("gcs_bucket", &self.gcs_bucket)
            .field("upload_timeout", &self.upload_timeout)
            .field("local_storage_path", &self.local_storage_path)
            .field("local_storage_base_url", &self.local_storage_base_url)
            .finish()
    }
}

impl StorageConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match non_empty(ENV_STORAGE_BACKEND) {
            Some(value) => value
                .parse::<StorageBackend>()
                .with_context(|| format!("{} is invalid", ENV_STORAGE_BACKEND))?,
            None => StorageBackend::Gcs,
        };

        let upload_timeout_secs = match non_empty(ENV_GCS_UPLOAD_TIMEOUT_SECS) {
            Some(value) => value.trim().parse::<u64>().with_context(|| {
                format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_GCS_UPLOAD_TIMEOUT_SECS, value
                )
            })?,
            None => DEFAULT_UPLOAD_TIMEOUT_SECS,
        };

        if upload_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "{} must be greater than zero",
                ENV_GCS_UPLOAD_TIMEOUT_SECS
            ));
        }

        Ok(StorageConfig {
            backend,
            gcs_sa_key_json: non_empty(ENV_GCS_SA_KEY_JSON),
            gcs_bucket: non_empty(ENV_GCS_BUCKET),
            upload_timeout: Duration::from_secs(upload_timeout_secs),
            local_storage_path: non_empty(ENV_LOCAL_STORAGE_PATH),
            local_storage_base_url: non_empty(ENV_LOCAL_STORAGE_BASE_URL),
        })
    }

    /// Check that the variables required by the selected backend are set.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let missing: Vec<&str> = match self.backend {
            StorageBackend::Gcs => [
                (ENV_GCS_SA_KEY_JSON, self.gcs_sa_key_json.is_none()),
                (ENV_GCS_BUCKET, self.gcs_bucket.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect(),
            StorageBackend::Local => [
                (ENV_LOCAL_STORAGE_PATH, self.local_storage_path.is_none()),
                (ENV_LOCAL_STORAGE_BASE_URL, self.local_storage_base_url.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect(),
        };

        if !missing.is_empty() {
            return Err(anyhow::anyhow!(
                "{} storage backend requires: {}",
                self.backend,
                missing.join(", ")
            ));
        }

        Ok(())
    }

    pub fn gcs_sa_key_json(&self) -> Option<&str> {
        self.gcs_sa_key_json.as_deref()
    }

    pub fn gcs_bucket(&self) -> Option<&str> {
        self.gcs_bucket.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.local_storage_base_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn config_from(vars: &[(&str, &str)]) -> Result<StorageConfig, anyhow::Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StorageConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_gcs_with_sixty_second_timeout() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.backend, StorageBackend::Gcs);
        assert_eq!(config.upload_timeout, Duration::from_secs(60));
        assert!(config.gcs_bucket().is_none());
    }

    #[test]
    fn reads_gcs_settings() {
        let config = config_from(&[
            ("GCS_SA_KEY_JSON", "{\"type\":\"service_account\"}"),
            ("GCS_BUCKET", "my-bucket"),
            ("GCS_UPLOAD_TIMEOUT_SECS", "15"),
        ])
        .unwrap();

        assert_eq!(config.gcs_bucket(), Some("my-bucket"));
        assert_eq!(config.upload_timeout, Duration::from_secs(15));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = config_from(&[("GCS_SA_KEY_JSON", "  "), ("GCS_BUCKET", "b")]).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("GCS_SA_KEY_JSON"));
        assert!(!err.contains("GCS_BUCKET"));
    }

    #[test]
    fn local_backend_requires_path_and_url() {
        let config = config_from(&[("STORAGE_BACKEND", "local")]).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("LOCAL_STORAGE_PATH"));
        assert!(err.contains("LOCAL_STORAGE_BASE_URL"));
    }

    #[test]
    fn rejects_invalid_timeout_and_backend() {
        assert!(config_from(&[("GCS_UPLOAD_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config_from(&[("GCS_UPLOAD_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "ftp")]).is_err());
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = config_from(&[("GCS_SA_KEY_JSON", "secret-key-material")]).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key-material"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn load_env_file_reports_missing_file() {
        let err = load_env_file("/definitely/not/here/.env").unwrap_err();
        assert_eq!(
            err.to_string(),
            "file '/definitely/not/here/.env' cannot be found"
        );
    }

    #[test]
    fn load_env_file_sets_variables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "STOWAGE_CONFIG_TEST_VAR=from-dotenv").unwrap();

        load_env_file(file.path()).unwrap();
        assert_eq!(
            env::var("STOWAGE_CONFIG_TEST_VAR").as_deref(),
            Ok("from-dotenv")
        );
    }
}
