//! Tab host for the main screen.
//!
//! The tab set is static. The active tab is remembered under
//! `ACTIVE_TAB_KEY` so the next launch reopens it. Switching is immediate;
//! persisting the new choice happens in the background and a failure there
//! only costs the restore on next launch.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::storage::{Storage, StorageError, ACTIVE_TAB_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabSpec {
    /// Label shown in the tab bar
    pub name: &'static str,
    /// Stable identifier, also the persisted value
    pub key: &'static str,
    pub icon: &'static str,
}

pub const HOME_TAB: &str = "WelcomeScreen";
pub const PROFILE_TAB: &str = "Profile";
pub const TEST_TAB: &str = "Test";

pub const TABS: &[TabSpec] = &[
    TabSpec {
        name: "Home",
        key: HOME_TAB,
        icon: "⌂",
    },
    TabSpec {
        name: "Profile",
        key: PROFILE_TAB,
        icon: "☺",
    },
    TabSpec {
        name: "Test",
        key: TEST_TAB,
        icon: "⚙",
    },
];

/// Tab used when nothing was persisted
pub const DEFAULT_TAB: &str = HOME_TAB;

pub fn find_tab(key: &str) -> Option<&'static TabSpec> {
    TABS.iter().find(|t| t.key == key)
}

/// What the content area should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabView {
    /// Active tab not loaded yet
    Loading,
    Tab(&'static TabSpec),
    /// Stored key that no longer names a tab
    Unknown(String),
}

pub struct TabHost {
    storage: Arc<dyn Storage>,
    active: Option<String>,
    /// Selections handed out so far
    selections: u64,
    /// Highest selection already written; older writes are skipped
    written: Arc<Mutex<u64>>,
}

impl TabHost {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            active: None,
            selections: 0,
            written: Arc::new(Mutex::new(0)),
        }
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage)
    }

    /// Read the persisted tab key without touching a host
    pub async fn read_saved(storage: &dyn Storage) -> Result<Option<String>, StorageError> {
        storage.get_item(ACTIVE_TAB_KEY).await
    }

    /// Load the persisted selection, falling back to the default tab
    pub async fn load(&mut self) {
        let saved = match Self::read_saved(self.storage.as_ref()).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(error = %e, "Failed to read active tab, using default");
                None
            }
        };
        self.restore(saved);
    }

    /// Apply a value read by `read_saved`
    pub fn restore(&mut self, saved: Option<String>) {
        let key = saved
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_TAB.to_string());
        debug!(tab = %key, "Active tab restored");
        self.active = Some(key);
    }

    /// Forget the in-memory selection (e.g. when the main screen unmounts)
    pub fn reset(&mut self) {
        self.active = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn view(&self) -> TabView {
        match self.active.as_deref() {
            None => TabView::Loading,
            Some(key) => match find_tab(key) {
                Some(spec) => TabView::Tab(spec),
                None => TabView::Unknown(key.to_string()),
            },
        }
    }

    /// Switch tabs. The returned handle resolves once the choice is
    /// persisted; dropping it lets the write finish in the background.
    ///
    /// Writes from quick successive switches may run out of order; a write
    /// older than one already stored is dropped, so the last selection wins.
    pub fn select(&mut self, key: &str) -> JoinHandle<()> {
        self.active = Some(key.to_string());
        self.selections += 1;
        let selection = self.selections;
        let written = Arc::clone(&self.written);
        let storage = self.storage();
        let key = key.to_string();
        tokio::spawn(async move {
            let mut last = written.lock().await;
            if *last > selection {
                debug!(tab = %key, "Skipping superseded tab write");
                return;
            }
            match storage.set_item(ACTIVE_TAB_KEY, &key).await {
                Ok(()) => *last = selection,
                Err(e) => warn!(error = %e, tab = %key, "Failed to persist active tab"),
            }
        })
    }

    fn active_index(&self) -> Option<usize> {
        let key = self.active.as_deref()?;
        TABS.iter().position(|t| t.key == key)
    }

    /// Select the next tab (wrapping around). An unknown tab moves to the first.
    pub fn next(&mut self) -> JoinHandle<()> {
        let index = self.active_index().map(|i| (i + 1) % TABS.len()).unwrap_or(0);
        self.select(TABS[index].key)
    }

    /// Select the previous tab (wrapping around). An unknown tab moves to the last.
    pub fn prev(&mut self) -> JoinHandle<()> {
        let index = self
            .active_index()
            .map(|i| (i + TABS.len() - 1) % TABS.len())
            .unwrap_or(TABS.len() - 1);
        self.select(TABS[index].key)
    }
}
