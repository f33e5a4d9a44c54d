//! Secret-backed client factory.
//!
//! A bot holds exactly one externally stored credential: the key for its
//! downstream service. [`LazyClient`] fetches it from a [`SecretStore`] the
//! first time a handler needs the client, builds the client once, and hands
//! out the same `Arc` for the rest of the process lifetime.
//!
//! # Concurrency
//!
//! Concurrent first calls collapse into a single secret-store fetch. A failed
//! fetch or build is returned to every waiting caller and is not cached, so
//! the next call retries.

mod error;
mod lazy;
mod store;

pub use error::{ClientInitError, SecretError, SecretResult};
pub use lazy::LazyClient;
pub use store::{
    AccessTokenSource, MetadataTokenSource, SecretManagerStore, SecretRef, SecretStore,
    DEFAULT_METADATA_TOKEN_URL, DEFAULT_SECRET_MANAGER_URL,
};
