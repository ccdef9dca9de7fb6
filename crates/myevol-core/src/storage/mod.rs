//! Durable key-value storage for small string values.
//!
//! This module provides:
//! - `Storage`: object-safe async trait shared as `Arc<dyn Storage>`
//! - `FileStore`: JSON map on disk in the data directory
//! - `KeyringStore`: OS keychain entries via keyring
//! - `MemoryStore`: in-process map
//!
//! All operations must succeed when the key has never been written.

pub mod file;
pub mod keyring;
pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;

use futures::future::BoxFuture;
use thiserror::Error;

pub use file::FileStore;
pub use self::keyring::KeyringStore;
pub use memory::MemoryStore;

/// Storage key holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the last active tab
pub const ACTIVE_TAB_KEY: &str = "myapp_active_tab";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keychain(#[from] ::keyring::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Asynchronous string key-value store.
pub trait Storage: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent.
    fn get_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>>;

    /// Write a value, replacing any previous one.
    fn set_item<'a>(&'a self, key: &'a str, value: &'a str)
        -> BoxFuture<'a, Result<(), StorageError>>;

    /// Remove a value. Removing an absent key is not an error.
    fn remove_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;
}
