use futures::future::{BoxFuture, FutureExt};
use ::keyring::Entry;
use tracing::debug;

use super::{Storage, StorageError};

/// Service name used for keychain entries
const SERVICE_NAME: &str = "myevol";

/// Key used by `probe` to check the keychain actually persists values
const PROBE_KEY: &str = "myevol-probe";

/// Key-value store backed by the OS keychain, one entry per key.
///
/// keyring calls are blocking, so each operation runs on the blocking pool.
#[derive(Clone)]
pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// True where the compiled keychain backend survives reboots and new
    /// login sessions. Linux only offers the kernel keyring without extra
    /// system libraries, and that one lives in memory.
    pub const fn is_persistent() -> bool {
        cfg!(any(target_os = "macos", target_os = "ios", target_os = "windows"))
    }

    /// Write, read back and delete a throwaway entry.
    ///
    /// Some platforms hand out a keychain that accepts writes but never
    /// returns them; this catches that before a token is trusted to it.
    pub async fn probe(&self) -> Result<bool, StorageError> {
        let marker = "ok";
        self.set_item(PROBE_KEY, marker).await?;
        let read = self.get_item(PROBE_KEY).await?;
        self.remove_item(PROBE_KEY).await?;
        Ok(read.as_deref() == Some(marker))
    }

    async fn blocking<T, F>(&self, key: &str, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> Result<T, ::keyring::Error> + Send + 'static,
    {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &key)?;
            op(entry)
        })
        .await?
        .map_err(StorageError::from)
    }
}

impl Storage for KeyringStore {
    fn get_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move {
            self.blocking(key, |entry| match entry.get_password() {
                Ok(value) => Ok(Some(value)),
                Err(::keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(e),
            })
            .await
        }
        .boxed()
    }

    fn set_item<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        let value = value.to_string();
        async move {
            self.blocking(key, move |entry| entry.set_password(&value))
                .await?;
            debug!(key, "Stored value in keychain");
            Ok(())
        }
        .boxed()
    }

    fn remove_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.blocking(key, |entry| match entry.delete_credential() {
                Ok(()) | Err(::keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(e),
            })
            .await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_keychain_is_not_trusted_with_tokens() {
        assert!(!KeyringStore::is_persistent());
    }

    #[cfg(any(target_os = "macos", target_os = "windows"))]
    #[test]
    fn test_desktop_keychains_are_persistent() {
        assert!(KeyringStore::is_persistent());
    }
}
