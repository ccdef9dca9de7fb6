//! API client for the MyEvol REST API.
//!
//! This module provides the `ApiClient` struct for exchanging credentials
//! for a bearer token and making requests authenticated with the token
//! currently held by the `TokenStore`.

use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::models::{CredentialsBody, TokenCheck, TokenResponse, UserProfile};
use crate::auth::TokenStore;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Paths of the endpoints the client talks to, relative to the base URL.
///
/// Deployments that serve everything under `/api` put that prefix in the
/// base URL rather than here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub token: &'static str,
    pub test_token: &'static str,
    pub me: &'static str,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token: "/token/",
            test_token: "/test-token/",
            me: "/users/me/",
        }
    }
}

/// API client for the MyEvol backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    endpoints: Endpoints,
    tokens: TokenStore,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str, tokens: TokenStore) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints: Endpoints::default(),
            tokens,
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    // ===== Authentication =====

    /// Exchange an email/password pair for a bearer token.
    ///
    /// Does not touch the token store; persisting the result is up to the
    /// session.
    pub async fn exchange_credentials(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let endpoint = self.endpoints.token;
        let url = self.url(endpoint);
        debug!(url = %url, "Exchanging credentials");

        let response = self
            .client
            .post(&url)
            .json(&CredentialsBody { email, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Credential exchange rejected");
            return Err(ApiError::from_login_status(status, &body));
        }

        let auth: TokenResponse = Self::parse_json(response, endpoint).await?;
        if auth.access.trim().is_empty() {
            return Err(ApiError::malformed(endpoint, "empty access token"));
        }

        Ok(auth.access)
    }

    /// Send a request carrying `Authorization: Bearer <token>` when a token
    /// is stored. Without one the request goes out unauthenticated and the
    /// server decides.
    pub async fn authenticated_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        let mut request = self.client.request(method.clone(), &url);

        match self.tokens.read().await? {
            Some(token) => request = request.bearer_auth(token),
            None => debug!(url = %url, "No stored token, sending unauthenticated"),
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, url = %url, "Sending request");
        let response = request.send().await?;
        Self::check_response(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::malformed(endpoint, e))
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let response = self.authenticated_request(Method::GET, endpoint, None).await?;
        Self::parse_json(response, endpoint).await
    }

    // ===== Authenticated probes =====

    /// Ask the server to validate the stored token
    pub async fn test_token(&self) -> Result<TokenCheck, ApiError> {
        self.get(self.endpoints.test_token).await
    }

    /// Fetch the profile of the signed-in user
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        let endpoint = self.endpoints.me;
        let body: Value = self.get(endpoint).await?;
        UserProfile::from_body(body).map_err(|reason| ApiError::malformed(endpoint, reason))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStore;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, TokenStore::new(Arc::new(MemoryStore::new()))).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let api = client("https://example.test/api/");
        assert_eq!(api.base_url(), "https://example.test/api");
        assert_eq!(api.url("/token/"), "https://example.test/api/token/");
        assert_eq!(api.url("users/me/"), "https://example.test/api/users/me/");
    }

    #[test]
    fn test_default_endpoints() {
        let api = client("https://example.test");
        assert_eq!(api.endpoints().token, "/token/");
        assert_eq!(api.endpoints().test_token, "/test-token/");
        assert_eq!(api.endpoints().me, "/users/me/");
    }

    #[test]
    fn test_with_endpoints_overrides_paths() {
        let api = client("https://example.test").with_endpoints(Endpoints {
            me: "/me/",
            ..Endpoints::default()
        });
        assert_eq!(api.endpoints().me, "/me/");
        assert_eq!(api.endpoints().token, "/token/");
    }
}
