//! Behaviour behind the welcome, profile and token test screens.
//!
//! These functions hold everything a screen does besides drawing, so the
//! front end only maps outcomes to widgets.

use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError, TokenCheck, UserProfile};
use crate::session::SessionView;
use crate::tabs::{TabHost, TEST_TAB};

/// Result of asking for a screen that needs a signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    ConnectionRequired,
}

/// Welcome screen "test the token" action.
///
/// Signed out: nothing happens besides the `ConnectionRequired` answer.
/// Signed in: the Test tab becomes the active (and persisted) tab.
pub fn open_token_test(session: &SessionView, tabs: &mut TabHost) -> Access {
    if !session.is_authenticated() {
        debug!("Token test requested while signed out");
        return Access::ConnectionRequired;
    }
    // Persistence is best effort
    drop(tabs.select(TEST_TAB));
    Access::Granted
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenTestOutcome {
    /// No token, no request sent
    ConnectionRequired,
    Valid(TokenCheck),
    Failed(String),
}

/// Probe the stored token against the server
pub async fn run_token_test(session: &SessionView, api: &ApiClient) -> TokenTestOutcome {
    if !session.is_authenticated() {
        return TokenTestOutcome::ConnectionRequired;
    }

    match api.test_token().await {
        Ok(check) => TokenTestOutcome::Valid(check),
        Err(e) => {
            warn!(error = %e, "Token test failed");
            TokenTestOutcome::Failed(failure_message(&e, "Invalid token or server error"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOutcome {
    Loaded(UserProfile),
    Failed(String),
}

/// Load the signed-in user's profile
pub async fn load_profile(api: &ApiClient) -> ProfileOutcome {
    match api.current_user().await {
        Ok(profile) => ProfileOutcome::Loaded(profile),
        Err(e) => {
            warn!(error = %e, "Failed to load profile");
            ProfileOutcome::Failed(failure_message(&e, "Unable to load the user"))
        }
    }
}

fn failure_message(error: &ApiError, headline: &str) -> String {
    match error {
        ApiError::Unauthorized => format!("{}: the server rejected the token", headline),
        e if e.is_network() => format!("{}: server unreachable", headline),
        e => format!("{}: {}", headline, e),
    }
}
