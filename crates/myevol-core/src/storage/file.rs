use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::Mutex;
use tracing::debug;

use super::{Storage, StorageError};

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// Key-value store persisted as a single JSON object on disk.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// real one, so a crash mid-write leaves the previous map intact.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(data_dir: &Path) -> Self {
        Self::at(data_dir.join(STORAGE_FILE))
    }

    /// Use an explicit file path instead of `<data_dir>/storage.json`
    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::io(&self.path, e)),
        }
    }

    async fn store(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }

        let contents = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;
        Ok(())
    }
}

impl Storage for FileStore {
    fn get_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move {
            let _guard = self.lock.lock().await;
            Ok(self.load().await?.remove(key))
        }
        .boxed()
    }

    fn set_item<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let _guard = self.lock.lock().await;
            let mut map = self.load().await?;
            map.insert(key.to_string(), value.to_string());
            self.store(&map).await?;
            debug!(key, path = ?self.path, "Stored value");
            Ok(())
        }
        .boxed()
    }

    fn remove_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let _guard = self.lock.lock().await;
            let mut map = self.load().await?;
            if map.remove(key).is_some() {
                self.store(&map).await?;
                debug!(key, path = ?self.path, "Removed value");
            }
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert_eq!(store.get_item("token").await.unwrap(), None);
        // Removing from a store that was never written is fine
        store.remove_item("token").await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_values_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileStore::new(dir.path());
        store.set_item("token", "abc").await.unwrap();
        store.set_item("myapp_active_tab", "Test").await.unwrap();
        drop(store);

        let reopened = FileStore::new(dir.path());
        assert_eq!(reopened.get_item("token").await.unwrap().as_deref(), Some("abc"));
        assert_eq!(
            reopened.get_item("myapp_active_tab").await.unwrap().as_deref(),
            Some("Test")
        );
    }

    #[tokio::test]
    async fn test_overwrite_and_remove_leave_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.set_item("token", "first").await.unwrap();
        store.set_item("token", "second").await.unwrap();
        store.set_item("other", "kept").await.unwrap();
        assert_eq!(store.get_item("token").await.unwrap().as_deref(), Some("second"));

        store.remove_item("token").await.unwrap();
        assert_eq!(store.get_item("token").await.unwrap(), None);
        assert_eq!(store.get_item("other").await.unwrap().as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::at(dir.path().join("nested").join("deeper").join("store.json"));

        store.set_item("token", "abc").await.unwrap();
        assert_eq!(store.get_item("token").await.unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(store.path(), "not json").unwrap();

        let err = store.get_item("token").await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
