//! REST API client module for the MyEvol backend.
//!
//! This module provides the `ApiClient` for exchanging credentials for a
//! bearer token and for making requests authenticated with that token.
//!
//! Response bodies are parsed into the explicit schemas in `models` at the
//! boundary; anything that does not fit becomes `ApiError::MalformedResponse`.

pub mod client;
pub mod error;
pub mod models;

pub use client::{ApiClient, Endpoints};
pub use error::ApiError;
pub use models::{TokenCheck, TokenResponse, UserProfile};
