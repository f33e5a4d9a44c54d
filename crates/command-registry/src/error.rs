//! Error types for command registration.

use thiserror::Error;

/// Failure talking to the registration API.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-success status.
    #[error("registration API returned {status} for {operation}: {message}")]
    Api {
        status: u16,
        operation: String,
        message: String,
    },

    /// A descriptor failed local validation before any call was made.
    #[error("invalid command descriptor: {0}")]
    Descriptor(#[from] interaction_protocol_types::DescriptorError),
}

pub type RegistrationResult<T> = Result<T, RegistrationError>;
