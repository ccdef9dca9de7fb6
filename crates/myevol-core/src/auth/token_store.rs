use std::sync::Arc;

use tracing::{debug, warn};

use crate::storage::{Storage, StorageError, TOKEN_KEY};

/// Durable home of the single bearer token.
///
/// The token lives in one active storage. Stores picked on earlier launches
/// can be registered with `with_stale`: saving or clearing also removes the
/// token from them, so a single token exists across all backends.
///
/// Clone is cheap; every clone talks to the same underlying storage.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
    stale: Vec<Arc<dyn Storage>>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            stale: Vec::new(),
        }
    }

    /// Register a backend that may hold a token left by an earlier launch
    pub fn with_stale(mut self, storage: Arc<dyn Storage>) -> Self {
        self.stale.push(storage);
        self
    }

    /// Persist the token, overwriting any previous one
    pub async fn save(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set_item(TOKEN_KEY, token).await?;
        // The new token is already safe; leftovers elsewhere only get a warning
        for storage in &self.stale {
            if let Err(e) = storage.remove_item(TOKEN_KEY).await {
                warn!(error = %e, "Failed to drop token from previous backend");
            }
        }
        debug!("Token saved");
        Ok(())
    }

    /// Read the persisted token, if any
    pub async fn read(&self) -> Result<Option<String>, StorageError> {
        let token = self.storage.get_item(TOKEN_KEY).await?;
        // An empty string is never a usable bearer token
        Ok(token.filter(|t| !t.is_empty()))
    }

    /// Remove the persisted token from every backend. Succeeds when none is
    /// stored. All backends are attempted; the first failure is returned.
    pub async fn clear(&self) -> Result<(), StorageError> {
        let mut result = self.storage.remove_item(TOKEN_KEY).await;
        for storage in &self.stale {
            if let Err(e) = storage.remove_item(TOKEN_KEY).await {
                warn!(error = %e, "Failed to drop token from previous backend");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result?;
        debug!("Token cleared");
        Ok(())
    }
}
