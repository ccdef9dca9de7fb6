//! Application state management for MyEvol.
//!
//! This module contains the `App` struct that holds UI state and wires key
//! presses to session, navigation and tab operations. Anything that touches
//! the network or storage runs in a spawned task and reports back through
//! an MPSC channel drained once per frame.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use myevol_core::navigation::NavigationError;
use myevol_core::screens::{self, Access, ProfileOutcome, TokenTestOutcome};
use myevol_core::tabs::{PROFILE_TAB, TABS, TEST_TAB};
use myevol_core::{
    Config, Graph, LoginError, Navigator, Route, Session, SessionContext, SessionView, Storage,
    TabHost,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// Tasks are user-triggered, so a handful in flight is the norm.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Maximum length for email input (RFC 5321 path limit).
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// UI State Types
// ============================================================================

/// Overlay state on top of the current route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingLogout,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// Short message shown in the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub text: String,
}

/// Data fetched for a screen
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Ready(T),
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned tasks.
///
/// Results tagged with a navigation generation are dropped if the tree has
/// been remounted since the task started.
enum TaskResult {
    Login(Result<(), LoginError>),
    LoggedOut,
    TabsLoaded {
        generation: u64,
        saved: Option<String>,
    },
    Profile {
        generation: u64,
        outcome: ProfileOutcome,
    },
    TokenTest {
        generation: u64,
        outcome: TokenTestOutcome,
    },
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    session: Arc<SessionContext>,
    view: SessionView,
    pub navigator: Navigator,
    pub tabs: TabHost,

    // UI State
    pub state: AppState,
    pub notice: Option<Notice>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_pending: bool,

    // Screen data
    pub profile: Loadable<ProfileOutcome>,
    pub token_test: Loadable<TokenTestOutcome>,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
}

impl App {
    pub fn new(config: Config, session: Arc<SessionContext>, tab_storage: Arc<dyn Storage>) -> Self {
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let view = session.subscribe();

        Self {
            config,
            session,
            view,
            navigator: Navigator::new(),
            tabs: TabHost::new(tab_storage),

            state: AppState::Normal,
            notice: None,

            login_email: String::new(),
            login_password: String::new(),
            login_focus: LoginFocus::Email,
            login_error: None,
            login_pending: false,

            profile: Loadable::Idle,
            token_test: Loadable::Idle,

            task_rx,
            task_tx,
        }
    }

    /// Kick off the startup read of the token store. The UI shows the
    /// loading splash until the session resolves.
    pub fn start(&self) {
        let session = Arc::clone(&self.session);
        tokio::spawn(async move {
            let restored = session.restore().await;
            debug!(authenticated = restored.is_authenticated(), "Startup session resolved");
        });
    }

    /// Per-frame housekeeping
    pub fn tick(&mut self) {
        self.check_background_tasks();
        self.sync_session();
    }

    pub fn session(&self) -> Session {
        self.view.current()
    }

    pub fn route(&self) -> Option<Route> {
        self.navigator.current()
    }

    pub fn is_authenticated(&self) -> bool {
        self.view.is_authenticated()
    }

    fn notify(&mut self, kind: NoticeKind, title: &str, text: &str) {
        self.notice = Some(Notice {
            kind,
            title: title.to_string(),
            text: text.to_string(),
        });
    }

    fn spawn_task<F>(&self, task: F)
    where
        F: std::future::Future<Output = TaskResult> + Send + 'static,
    {
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = task.await;
            if let Err(e) = tx.send(result).await {
                error!(error = %e, "Failed to send task result - channel closed");
            }
        });
    }

    // =========================================================================
    // Session & Navigation
    // =========================================================================

    /// Remount the navigation tree if the session changed graph
    fn sync_session(&mut self) {
        if !self.view.has_changed() {
            return;
        }
        let session = self.view.mark_seen();
        if self.navigator.sync(&session) {
            self.on_remount();
        }
    }

    fn on_remount(&mut self) {
        info!(graph = ?self.navigator.graph(), generation = self.navigator.generation(), "Navigation remounted");
        self.state = AppState::Normal;
        self.tabs.reset();
        self.profile = Loadable::Idle;
        self.token_test = Loadable::Idle;
        self.login_password.clear();
        self.login_error = None;

        if self.navigator.graph() == Graph::Member {
            self.spawn_tab_load();
        }
    }

    fn navigate(&mut self, route: Route) {
        if let Err(NavigationError::Unreachable { route, graph }) = self.navigator.navigate(route) {
            warn!(?route, ?graph, "Ignoring navigation outside the mounted graph");
        }
    }

    pub fn go_back(&mut self) {
        self.navigator.back();
    }

    /// Show the login screen
    pub fn start_login(&mut self) {
        self.navigate(Route::Login);
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    pub fn open_main(&mut self) {
        self.navigate(Route::Main);
        self.on_tab_activated();
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn can_submit_login(&self) -> bool {
        !self.login_email.trim().is_empty() && !self.login_password.is_empty() && !self.login_pending
    }

    /// Submit the login form
    pub fn submit_login(&mut self) {
        if self.login_pending {
            return;
        }
        if !self.can_submit_login() {
            self.login_error = Some(LoginError::MissingCredentials.user_message());
            return;
        }

        self.login_pending = true;
        self.login_error = None;

        let session = Arc::clone(&self.session);
        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();
        self.spawn_task(async move { TaskResult::Login(session.login(&email, &password).await) });
    }

    pub fn request_logout(&mut self) {
        if self.is_authenticated() {
            self.state = AppState::ConfirmingLogout;
        }
    }

    pub fn confirm_logout(&mut self) {
        self.state = AppState::Normal;
        let session = Arc::clone(&self.session);
        self.spawn_task(async move {
            session.logout().await;
            TaskResult::LoggedOut
        });
    }

    // =========================================================================
    // Tabs & Screens
    // =========================================================================

    fn spawn_tab_load(&self) {
        let storage = self.tabs.storage();
        let generation = self.navigator.generation();
        self.spawn_task(async move {
            let saved = match TabHost::read_saved(storage.as_ref()).await {
                Ok(saved) => saved,
                Err(e) => {
                    warn!(error = %e, "Failed to read active tab, using default");
                    None
                }
            };
            TaskResult::TabsLoaded { generation, saved }
        });
    }

    pub fn select_tab(&mut self, key: &str) {
        drop(self.tabs.select(key));
        self.on_tab_activated();
    }

    pub fn select_tab_index(&mut self, index: usize) {
        if let Some(tab) = TABS.get(index) {
            self.select_tab(tab.key);
        }
    }

    pub fn next_tab(&mut self) {
        drop(self.tabs.next());
        self.on_tab_activated();
    }

    pub fn prev_tab(&mut self) {
        drop(self.tabs.prev());
        self.on_tab_activated();
    }

    /// Screens fetch their data every time they are shown
    pub fn on_tab_activated(&mut self) {
        if self.route() != Some(Route::Main) {
            return;
        }
        match self.tabs.active_key() {
            Some(PROFILE_TAB) => self.load_profile(),
            Some(TEST_TAB) => self.run_token_test(),
            _ => {}
        }
    }

    fn load_profile(&mut self) {
        self.profile = Loadable::Loading;
        let api = self.session.api().clone();
        let generation = self.navigator.generation();
        self.spawn_task(async move {
            TaskResult::Profile {
                generation,
                outcome: screens::load_profile(&api).await,
            }
        });
    }

    fn run_token_test(&mut self) {
        self.token_test = Loadable::Loading;
        let api = self.session.api().clone();
        let view = self.view.clone();
        let generation = self.navigator.generation();
        self.spawn_task(async move {
            TaskResult::TokenTest {
                generation,
                outcome: screens::run_token_test(&view, &api).await,
            }
        });
    }

    /// Reload whatever the active tab shows
    pub fn refresh_current_tab(&mut self) {
        self.on_tab_activated();
    }

    /// Welcome screen action: jump to the token test tab
    pub fn open_token_test(&mut self) {
        match screens::open_token_test(&self.view, &mut self.tabs) {
            Access::ConnectionRequired => {
                self.notify(
                    NoticeKind::Error,
                    "Connection required",
                    "Please sign in to run the token test.",
                );
            }
            Access::Granted => self.open_main(),
        }
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.task_rx.try_recv() {
            results.push(result);
        }

        for result in results {
            self.process_task_result(result);
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        let current_generation = self.navigator.generation();
        match result {
            TaskResult::Login(Ok(())) => {
                self.login_pending = false;
                self.login_password.clear();
                self.notify(NoticeKind::Success, "Welcome!", "You are now signed in.");
            }
            TaskResult::Login(Err(e)) => {
                self.login_pending = false;
                self.login_error = Some(e.user_message());
                self.notify(NoticeKind::Error, "Sign-in error", &e.user_message());
            }
            TaskResult::LoggedOut => {
                self.notify(NoticeKind::Info, "Signed out", "See you soon.");
            }
            TaskResult::TabsLoaded { generation, saved } => {
                // A selection made while loading wins over the stored one
                if generation == current_generation && !self.tabs.is_loaded() {
                    self.tabs.restore(saved);
                    self.on_tab_activated();
                }
            }
            TaskResult::Profile { generation, outcome } => {
                if generation == current_generation {
                    self.profile = Loadable::Ready(outcome);
                } else {
                    debug!("Dropping profile result from a previous mount");
                }
            }
            TaskResult::TokenTest { generation, outcome } => {
                if generation == current_generation {
                    self.token_test = Loadable::Ready(outcome);
                } else {
                    debug!("Dropping token test result from a previous mount");
                }
            }
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if an email character should be accepted
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
