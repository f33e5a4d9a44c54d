//! Secret store and client initialization errors.

use std::sync::Arc;
use thiserror::Error;

/// Error talking to the secret store.
#[derive(Error, Debug)]
pub enum SecretError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store answered with a non-success status
    #[error("secret store returned {status} for {secret}")]
    Status { status: u16, secret: String },

    /// Payload could not be decoded into text
    #[error("secret payload could not be decoded: {0}")]
    Decode(String),

    /// Could not obtain an access token for the store
    #[error("access token unavailable: {0}")]
    Token(String),
}

/// Result type alias using SecretError.
pub type SecretResult<T> = Result<T, SecretError>;

/// Error building the downstream client. Never cached.
///
/// Cloned to every caller that waited on the same attempt.
#[derive(Error, Debug, Clone)]
pub enum ClientInitError {
    #[error("failed to fetch credential: {0}")]
    Secret(#[source] Arc<SecretError>),

    #[error("credential {0} is empty")]
    EmptySecret(String),

    #[error("failed to build client: {0}")]
    Build(String),
}

impl From<SecretError> for ClientInitError {
    fn from(err: SecretError) -> Self {
        Self::Secret(Arc::new(err))
    }
}
