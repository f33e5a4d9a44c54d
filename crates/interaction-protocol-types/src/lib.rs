//! Wire types for the chat platform's interaction protocol.
//!
//! This crate is pure: it parses inbound interaction payloads into
//! [`Interaction`] values, describes commands for the registration API, and
//! shapes the acknowledgment and follow-up bodies. Transport lives elsewhere.

mod command;
mod error;
mod interaction;
mod response;

pub use command::{ArgumentKind, ArgumentSpec, CommandDescriptor, RegisteredCommand};
pub use error::{DescriptorError, ParseError};
pub use interaction::{
    AckState, Argument, ArgumentValue, Interaction, InteractionKind, InteractionToken,
};
pub use response::{
    AttachmentRef, FileAttachment, FollowupMessage, InteractionResponse,
    DEFERRED_CHANNEL_MESSAGE, PONG,
};
