//! Stowage Storage Library
//!
//! This crate provides the `Storager` abstraction and its implementations for
//! Google Cloud Storage and the local filesystem, plus test doubles.
//!
//! # Object names
//!
//! Upload destinations are cleaned lexically before use (`a//b/../c` becomes
//! `a/c`, a leading `/` is dropped). Names that would climb out of the bucket
//! root are rejected. Listing prefixes are matched as raw strings, so `img`
//! matches both `img/a.png` and `imgs.txt`.

pub mod factory;
#[cfg(feature = "storage-gcs")]
pub mod gcs;
#[cfg(feature = "storage-gcs")]
pub mod global;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod mock;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-gcs")]
pub use gcs::GoogleStorage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use mock::{MemoryStorage, NoopStorage};
pub use stowage_core::{File, ObjectAttrs, StorageBackend};
pub use traits::{BoxedReader, StorageError, StorageResult, Storager};
