//! Stowage Core Library
//!
//! This crate provides the storage record types, backend selection and
//! environment-driven configuration shared by the storage and CLI crates.

pub mod config;
pub mod constants;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{load_env_file, StorageConfig};
pub use models::{File, ObjectAttrs};
pub use storage_types::StorageBackend;
