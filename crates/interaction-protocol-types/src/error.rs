//! Protocol error types.

use thiserror::Error;

/// Why an inbound interaction payload could not be understood.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Body is not JSON of the expected shape
    #[error("malformed interaction payload: {0}")]
    Malformed(String),

    /// Interaction type this bot does not handle
    #[error("unsupported interaction type: {0}")]
    UnsupportedType(u8),

    /// Required field absent or empty
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Argument value does not match its declared type
    #[error("invalid value for argument {0}")]
    InvalidArgument(String),

    /// Argument type this bot does not handle
    #[error("unsupported argument type {kind} for argument {name}")]
    UnsupportedArgumentType { name: String, kind: u8 },
}

/// Why a command descriptor would be refused by the registration API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("invalid command name {0:?}: expected 1-32 lowercase letters, digits, '-' or '_'")]
    InvalidName(String),

    #[error("command {0} needs a description of 1-100 characters")]
    InvalidDescription(String),

    #[error("command {command}: required argument {argument} follows an optional one")]
    RequiredAfterOptional { command: String, argument: String },

    #[error("command {command}: duplicate argument {argument}")]
    DuplicateArgument { command: String, argument: String },
}
