//! Bearer token persistence.
//!
//! `TokenStore` keeps a single token under a fixed storage key. There is no
//! expiry, refresh or rotation: a token stays valid until logout clears it
//! or the server starts rejecting it.

pub mod token_store;

pub use token_store::TokenStore;
