//! Session context: the single owner of authentication state.
//!
//! The session moves through three states:
//!
//! ```text
//!   Unknown ──restore()──▶ Authenticated | Unauthenticated
//!   Unauthenticated ──login()──▶ Authenticated
//!   Authenticated ──logout()──▶ Unauthenticated
//! ```
//!
//! `SessionContext` is the only writer. Everyone else holds a `SessionView`,
//! a read-only handle that observes every published state.
//!
//! Login and logout are serialized: a second call waits for the first to
//! finish, so overlapping submits run one after the other and the last one
//! to complete decides the final state.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::TokenStore;
use crate::storage::StorageError;

/// How the current authenticated session came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    /// Fresh credential exchange in this process
    Login,
    /// Token persisted by an earlier run
    Restored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// Startup, token store not read yet
    Unknown,
    Unauthenticated,
    Authenticated {
        token: String,
        since: DateTime<Utc>,
        origin: SessionOrigin,
    },
}

impl Session {
    fn authenticated(token: String, origin: SessionOrigin) -> Self {
        Session::Authenticated {
            token,
            since: Utc::now(),
            origin,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Session::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// False until the startup read of the token store has finished
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Session::Unknown)
    }

    pub fn origin(&self) -> Option<SessionOrigin> {
        match self {
            Session::Authenticated { origin, .. } => Some(*origin),
            _ => None,
        }
    }

    /// Human readable age of the session, e.g. "5m ago"
    pub fn age_display(&self) -> Option<String> {
        match self {
            Session::Authenticated { since, .. } => Some(format_age(Utc::now() - *since)),
            _ => None,
        }
    }
}

fn format_age(age: Duration) -> String {
    let minutes = age.num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Signed in, but the session could not be saved: {0}")]
    Persistence(#[from] StorageError),
}

impl LoginError {
    /// Message suitable for showing on the login screen
    pub fn user_message(&self) -> String {
        match self {
            LoginError::MissingCredentials => "Email and password are required".to_string(),
            LoginError::Api(ApiError::InvalidCredentials) => {
                "Invalid email or password".to_string()
            }
            LoginError::Api(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            LoginError::Api(e) if e.is_network() => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            LoginError::Api(ApiError::RateLimited) => {
                "Too many attempts. Please wait before retrying.".to_string()
            }
            LoginError::Api(e) => format!("Login failed: {}", e),
            LoginError::Persistence(_) => {
                "Signed in, but the session could not be saved on this device".to_string()
            }
        }
    }
}

/// Read-only handle on the session.
#[derive(Clone)]
pub struct SessionView {
    rx: watch::Receiver<Session>,
}

impl SessionView {
    /// Snapshot of the current state
    pub fn current(&self) -> Session {
        self.rx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.rx.borrow().token().map(str::to_string)
    }

    /// True if a state was published since the last `mark_seen`/`changed`
    pub fn has_changed(&self) -> bool {
        // Err only when the context is gone, which means nothing changes anymore
        self.rx.has_changed().unwrap_or(false)
    }

    /// Snapshot of the current state, marking it as seen
    pub fn mark_seen(&mut self) -> Session {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next published state. Returns `None` once the session
    /// context has been dropped.
    pub async fn changed(&mut self) -> Option<Session> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

pub struct SessionContext {
    api: ApiClient,
    tokens: TokenStore,
    state: watch::Sender<Session>,
    // Serializes login/logout
    op_lock: Mutex<()>,
}

impl SessionContext {
    pub fn new(api: ApiClient, tokens: TokenStore) -> Self {
        let (state, _) = watch::channel(Session::Unknown);
        Self {
            api,
            tokens,
            state,
            op_lock: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> SessionView {
        SessionView {
            rx: self.state.subscribe(),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn publish(&self, session: Session) {
        debug!(authenticated = session.is_authenticated(), "Publishing session state");
        self.state.send_replace(session);
    }

    /// Resolve the startup state from the token store.
    ///
    /// Runs once; later calls return the current state without reading the
    /// store. A failed read is logged and treated as "no token".
    pub async fn restore(&self) -> Session {
        let _guard = self.op_lock.lock().await;
        if self.state.borrow().is_resolved() {
            return self.snapshot();
        }

        let session = match self.tokens.read().await {
            Ok(Some(token)) => {
                info!("Restored session from stored token");
                Session::authenticated(token, SessionOrigin::Restored)
            }
            Ok(None) => {
                debug!("No stored token");
                Session::Unauthenticated
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored token, starting signed out");
                Session::Unauthenticated
            }
        };

        self.publish(session.clone());
        session
    }

    /// Exchange credentials for a token, persist it and become Authenticated.
    ///
    /// On any failure the published state is left as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), LoginError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let _guard = self.op_lock.lock().await;

        let token = match self.api.exchange_credentials(email, password).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Login failed");
                return Err(e.into());
            }
        };

        if let Err(e) = self.tokens.save(&token).await {
            warn!(error = %e, "Login succeeded but the token could not be stored");
            return Err(e.into());
        }

        self.publish(Session::authenticated(token, SessionOrigin::Login));
        info!("Login successful");
        Ok(())
    }

    /// Forget the token, durably and in memory.
    ///
    /// A failure to clear the store is logged and otherwise ignored; the
    /// in-memory session is cleared regardless.
    pub async fn logout(&self) {
        let _guard = self.op_lock.lock().await;

        if let Err(e) = self.tokens.clear().await {
            warn!(error = %e, "Failed to clear stored token during logout");
        }

        self.publish(Session::Unauthenticated);
        info!("Logged out");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::testing::FlakyStore;
    use crate::storage::{MemoryStore, Storage, TOKEN_KEY};

    // Nothing listens here; tests below never reach the network
    const UNREACHABLE_API: &str = "http://127.0.0.1:9";

    fn context_with(storage: Arc<dyn Storage>) -> SessionContext {
        let tokens = TokenStore::new(storage);
        let api = ApiClient::new(UNREACHABLE_API, tokens.clone()).unwrap();
        SessionContext::new(api, tokens)
    }

    #[test]
    fn test_session_accessors() {
        assert!(!Session::Unknown.is_resolved());
        assert!(!Session::Unknown.is_authenticated());
        assert!(Session::Unauthenticated.is_resolved());
        assert_eq!(Session::Unauthenticated.token(), None);

        let session = Session::authenticated("abc".to_string(), SessionOrigin::Login);
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("abc"));
        assert_eq!(session.origin(), Some(SessionOrigin::Login));
        assert_eq!(session.age_display().as_deref(), Some("just now"));
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::seconds(-30)), "just now");
        assert_eq!(format_age(Duration::seconds(30)), "just now");
        assert_eq!(format_age(Duration::minutes(5)), "5m ago");
        assert_eq!(format_age(Duration::minutes(125)), "2h ago");
        assert_eq!(format_age(Duration::days(3)), "3d ago");
    }

    #[tokio::test]
    async fn test_starts_unknown() {
        let ctx = context_with(Arc::new(MemoryStore::new()));
        assert_eq!(ctx.snapshot(), Session::Unknown);
        assert_eq!(ctx.subscribe().current(), Session::Unknown);
    }

    #[tokio::test]
    async fn test_restore_with_persisted_token() {
        let ctx = context_with(Arc::new(MemoryStore::with_item(TOKEN_KEY, "persisted")));
        let session = ctx.restore().await;

        assert_eq!(session.token(), Some("persisted"));
        assert_eq!(session.origin(), Some(SessionOrigin::Restored));
        assert_eq!(ctx.snapshot().token(), Some("persisted"));
    }

    #[tokio::test]
    async fn test_restore_without_token() {
        let ctx = context_with(Arc::new(MemoryStore::new()));
        assert_eq!(ctx.restore().await, Session::Unauthenticated);
    }

    #[tokio::test]
    async fn test_restore_read_failure_resolves_signed_out() {
        let store = Arc::new(FlakyStore::with_item(TOKEN_KEY, "persisted"));
        store.fail_reads(true);
        let ctx = context_with(store);

        assert_eq!(ctx.restore().await, Session::Unauthenticated);
    }

    #[tokio::test]
    async fn test_restore_runs_once() {
        let store = Arc::new(MemoryStore::new());
        let ctx = context_with(store.clone());
        assert_eq!(ctx.restore().await, Session::Unauthenticated);

        // A token appearing later is not picked up by a second restore
        store.set_item(TOKEN_KEY, "late").await.unwrap();
        assert_eq!(ctx.restore().await, Session::Unauthenticated);
    }

    #[tokio::test]
    async fn test_login_with_empty_fields_is_rejected_locally() {
        let ctx = context_with(Arc::new(MemoryStore::new()));
        ctx.restore().await;

        assert!(matches!(
            ctx.login("", "secret").await,
            Err(LoginError::MissingCredentials)
        ));
        assert!(matches!(
            ctx.login("  ", "secret").await,
            Err(LoginError::MissingCredentials)
        ));
        assert!(matches!(
            ctx.login("ada@example.com", "").await,
            Err(LoginError::MissingCredentials)
        ));
        assert_eq!(ctx.snapshot(), Session::Unauthenticated);
    }

    #[tokio::test]
    async fn test_login_fails_when_token_cannot_be_stored() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": "fresh"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(FlakyStore::default());
        let tokens = TokenStore::new(store.clone());
        let api = ApiClient::new(&server.uri(), tokens.clone()).unwrap();
        let ctx = SessionContext::new(api, tokens);
        ctx.restore().await;
        store.fail_writes(true);

        let err = ctx.login("ada@example.com", "hunter2").await.unwrap_err();
        assert!(matches!(err, LoginError::Persistence(_)));
        assert_eq!(ctx.snapshot(), Session::Unauthenticated);
        assert_eq!(store.get_item(TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_store_and_state() {
        let store = Arc::new(MemoryStore::with_item(TOKEN_KEY, "persisted"));
        let ctx = context_with(store.clone());
        ctx.restore().await;
        assert!(ctx.snapshot().is_authenticated());

        ctx.logout().await;
        assert_eq!(ctx.snapshot(), Session::Unauthenticated);
        assert_eq!(store.get_item(TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let ctx = context_with(store.clone());
        ctx.restore().await;

        for _ in 0..2 {
            ctx.logout().await;
            assert_eq!(ctx.snapshot(), Session::Unauthenticated);
            assert_eq!(store.get_item(TOKEN_KEY).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_logout_clears_memory_even_if_store_fails() {
        let store = Arc::new(FlakyStore::with_item(TOKEN_KEY, "persisted"));
        let ctx = context_with(store.clone());
        ctx.restore().await;

        store.fail_writes(true);
        ctx.logout().await;

        assert_eq!(ctx.snapshot(), Session::Unauthenticated);
        // Durable and in-memory state have diverged
        store.fail_writes(false);
        assert_eq!(store.get_item(TOKEN_KEY).await.unwrap().as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn test_view_observes_changes() {
        let ctx = context_with(Arc::new(MemoryStore::with_item(TOKEN_KEY, "persisted")));
        let mut view = ctx.subscribe();
        assert!(!view.has_changed());

        ctx.restore().await;
        assert!(view.has_changed());
        assert!(view.mark_seen().is_authenticated());
        assert!(!view.has_changed());

        ctx.logout().await;
        assert_eq!(view.changed().await, Some(Session::Unauthenticated));
        assert!(!view.is_authenticated());
        assert_eq!(view.token(), None);
    }

    #[test]
    fn test_login_error_messages_are_distinct() {
        let missing = LoginError::MissingCredentials.user_message();
        let invalid = LoginError::Api(ApiError::InvalidCredentials).user_message();
        let server = LoginError::Api(ApiError::ServerError("boom".to_string())).user_message();
        let persistence = LoginError::Persistence(StorageError::io(
            "token",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        ))
        .user_message();

        assert_eq!(invalid, "Invalid email or password");
        assert!(server.starts_with("Login failed"));
        assert_ne!(missing, invalid);
        assert_ne!(invalid, persistence);
    }
}
