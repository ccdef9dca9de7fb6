use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::{BoxFuture, FutureExt};

use super::{MemoryStore, Storage, StorageError};

/// Memory store whose writes and removals can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FlakyStore {
    pub fn with_item(key: &str, value: &str) -> Self {
        Self {
            inner: MemoryStore::with_item(key, value),
            ..Default::default()
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn denied() -> StorageError {
        StorageError::io(
            "flaky",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        )
    }
}

impl Storage for FlakyStore {
    fn get_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return async { Err(Self::denied()) }.boxed();
        }
        self.inner.get_item(key)
    }

    fn set_item<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return async { Err(Self::denied()) }.boxed();
        }
        self.inner.set_item(key, value)
    }

    fn remove_item<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return async { Err(Self::denied()) }.boxed();
        }
        self.inner.remove_item(key)
    }
}
