//! Core library for the MyEvol client.
//!
//! Everything that is not drawing pixels lives here:
//!
//! - `storage`: asynchronous string key-value stores (file, keychain, memory)
//! - `auth`: the bearer token store
//! - `api`: HTTP client for credential exchange and authenticated requests
//! - `session`: the session context state machine
//! - `navigation`: route graph selection driven by the session
//! - `tabs`: the tab host with a persisted active tab
//! - `screens`: non-visual models behind the welcome, profile and test screens
//! - `config`: environment-provided configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod navigation;
pub mod screens;
pub mod session;
pub mod storage;
pub mod tabs;

pub use api::{ApiClient, ApiError};
pub use auth::TokenStore;
pub use config::Config;
pub use navigation::{Graph, Navigator, Route};
pub use session::{LoginError, Session, SessionContext, SessionView};
pub use storage::{Storage, StorageError};
pub use tabs::TabHost;
