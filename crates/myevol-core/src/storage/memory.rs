use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::Mutex;

use super::{Storage, StorageError};

/// In-process store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a value, e.g. a token "persisted" by a previous run
    pub fn with_item(key: &str, value: &str) -> Self {
        let mut values = HashMap::new();
        values.insert(key.to_string(), value.to_string());
        Self {
            values: Mutex::new(values),
        }
    }
}

impl Storage for MemoryStore {
    fn get_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move { Ok(self.values.lock().await.get(key).cloned()) }.boxed()
    }

    fn set_item<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.values
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
        .boxed()
    }

    fn remove_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.values.lock().await.remove(key);
            Ok(())
        }
        .boxed()
    }
}
